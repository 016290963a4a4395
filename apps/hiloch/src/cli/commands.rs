//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::config::AppConfig;
use chrono::{Local, NaiveDate, Utc};
use hiloch_core::{
    AccessDeniedNotice, CountdownReport, CourseSession, EXPENSE_TYPES, ExpenseDraft, GateUpdate,
    HilochError, NavigationObservation, Stage, format_amount, format_display_date,
    format_storage_date, parse_date,
};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum size of a navigation trace file (10 MB).
const MAX_TRACE_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), HilochError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| HilochError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(HilochError::SerializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Resolve a trace path to an existing regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, HilochError> {
    let canonical = path.canonicalize().map_err(|e| {
        HilochError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(HilochError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

// =============================================================================
// SHARED HELPERS
// =============================================================================

/// `--today` if given, else the local calendar date.
pub fn resolve_today(today: Option<&str>) -> Result<NaiveDate, HilochError> {
    match today {
        Some(raw) => parse_date(raw),
        None => Ok(Local::now().date_naive()),
    }
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

// =============================================================================
// COUNTER COMMAND
// =============================================================================

/// Show the countdown.
pub fn cmd_counter(
    config: &AppConfig,
    json_mode: bool,
    start: Option<&str>,
    today: Option<&str>,
) -> Result<(), HilochError> {
    let today = resolve_today(today)?;
    let start = match start {
        Some(raw) => Some(parse_date(raw)?),
        None => config.open_profile()?.start_date(),
    };

    let Some(start) = start else {
        if json_mode {
            print_json(&serde_json::json!({ "start_date": null }));
        } else {
            println!("No start date selected.");
            println!("Run `hiloch date set YYYY-MM-DD` with the day the licence fee was paid.");
        }
        return Ok(());
    };

    let report = CountdownReport::evaluate(start, today);

    if json_mode {
        let output = serde_json::json!({
            "start_date": format_storage_date(start),
            "today": format_storage_date(today),
            "stage_name": report.countdown.current_stage.name(),
            "motivation": report.progress.motivation.message(),
            "report": report,
        });
        print_json(&output);
        return Ok(());
    }

    print_counter(&report);
    Ok(())
}

fn print_counter(report: &CountdownReport) {
    let window = &report.window;
    let countdown = &report.countdown;
    let progress = &report.progress;

    println!("Accompanied Driving Counter");
    println!("===========================");
    println!("Start date: {}", format_display_date(report.start));
    println!("Today:      {}", format_display_date(report.today));
    println!();
    println!("Stage {}", Stage::Stage1);
    println!("  Ends:      {}", format_display_date(window.stage1_end));
    println!(
        "  Remaining: {} of {} days ({}%)",
        countdown.stage1_remaining, window.stage1_total_days, progress.stage1_percent
    );
    println!("Stage {}", Stage::Stage2);
    println!("  Ends:      {}", format_display_date(window.stage2_end));
    println!(
        "  Remaining: {} of {} days ({}%)",
        countdown.stage2_remaining, window.stage2_total_days, progress.stage2_percent
    );
    println!();
    println!("Current:   {}", countdown.current_stage);
    println!(
        "Progress:  {}% overall, {} days completed",
        progress.overall_percent, progress.days_completed
    );
    println!("Remaining: {} days", countdown.total_remaining);
    println!("{}", progress.motivation.message());

    if countdown.show_reminder {
        println!();
        println!(
            "תזכורת: נותרו {} ימים לסיום תקופת הליווי ({})",
            countdown.total_remaining,
            format_display_date(window.stage2_end)
        );
    }
}

// =============================================================================
// DATE COMMANDS
// =============================================================================

/// Show the stored start date.
pub fn cmd_date_show(config: &AppConfig, json_mode: bool) -> Result<(), HilochError> {
    let start = config.open_profile()?.start_date();

    if json_mode {
        print_json(&serde_json::json!({
            "start_date": start.map(format_storage_date),
        }));
        return Ok(());
    }

    match start {
        Some(date) => println!("Start date: {}", format_display_date(date)),
        None => println!("No start date selected."),
    }
    Ok(())
}

/// Store a new start date.
pub fn cmd_date_set(
    config: &AppConfig,
    json_mode: bool,
    date: &str,
    today: Option<&str>,
) -> Result<(), HilochError> {
    let date = parse_date(date)?;
    let today = resolve_today(today)?;
    let mut profile = config.open_profile()?;
    profile.select_start_date(date, today)?;

    if json_mode {
        print_json(&serde_json::json!({
            "success": true,
            "start_date": format_storage_date(date),
        }));
    } else {
        println!("Start date set to {}", format_display_date(date));
    }
    Ok(())
}

/// Forget the start date.
pub fn cmd_date_clear(config: &AppConfig, json_mode: bool) -> Result<(), HilochError> {
    let mut profile = config.open_profile()?;
    profile.clear_start_date()?;

    if json_mode {
        print_json(&serde_json::json!({ "success": true }));
    } else {
        println!("Start date cleared.");
    }
    Ok(())
}

// =============================================================================
// GATE COMMANDS
// =============================================================================

/// Classify a single URL.
pub fn cmd_gate_classify(config: &AppConfig, json_mode: bool, url: &str) -> Result<(), HilochError> {
    let policy = config.policy();
    let page = policy.classify(url);
    let verdict = policy.verdict(url);

    if json_mode {
        print_json(&serde_json::json!({
            "url": url,
            "page": page,
            "verdict": verdict.map(|v| v.as_str()),
            "suppresses_chrome": page.suppresses_chrome(),
        }));
        return Ok(());
    }

    println!("URL:     {}", url);
    println!("Page:    {:?}", page);
    println!(
        "Verdict: {}",
        verdict.map_or("none", |v| v.as_str())
    );
    Ok(())
}

/// Parse a trace file body: a JSON array of observations.
pub fn parse_trace(raw: &str) -> Result<Vec<NavigationObservation>, HilochError> {
    serde_json::from_str(raw)
        .map_err(|e| HilochError::SerializationError(format!("Invalid trace: {}", e)))
}

/// Parse one line of a live feed. Blank lines carry nothing.
pub fn parse_observation_line(line: &str) -> Result<Option<NavigationObservation>, HilochError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|e| HilochError::SerializationError(format!("Invalid observation: {}", e)))
}

/// Feed a whole trace through a session, one render decision per step.
pub fn replay_trace(session: &mut CourseSession, trace: &[NavigationObservation]) -> Vec<GateUpdate> {
    let now = Instant::now();
    trace.iter().map(|obs| session.observe(obs, now)).collect()
}

/// Replay a trace file.
pub fn cmd_gate_replay(config: &AppConfig, json_mode: bool, file: &Path) -> Result<(), HilochError> {
    let path = validate_file_path(file)?;
    validate_file_size(&path, MAX_TRACE_FILE_SIZE)?;
    let raw = std::fs::read_to_string(&path)
        .map_err(|e| HilochError::IoError(format!("Cannot read trace: {}", e)))?;
    let trace = parse_trace(&raw)?;

    let mut session = config.session();
    let updates = replay_trace(&mut session, &trace);
    let pending = session.next_deadline().is_some();
    let final_state = session.gate_state();

    if json_mode {
        let steps: Vec<serde_json::Value> = trace
            .iter()
            .zip(&updates)
            .map(|(obs, update)| serde_json::json!({ "observation": obs, "update": update }))
            .collect();
        print_json(&serde_json::json!({
            "course_url": config.course.url,
            "steps": steps,
            "final_state": final_state,
            "chrome_visible": session.chrome_visible(),
            "access_denied": session.update().access_denied(),
            "verification_pending": pending,
        }));
        return Ok(());
    }

    println!("Replaying {} observations (course: {})", trace.len(), config.course.url);
    println!();
    for (index, (obs, update)) in trace.iter().zip(&updates).enumerate() {
        let kind = format!("{:?}", obs.kind);
        println!("{:>4}  {:<18} {}", index, kind, obs.url);
        println!("      {}", describe_update(update));
    }
    println!();
    println!("Chrome visible: {}", session.chrome_visible());
    println!("Blocked:        {}", final_state.blocked);
    if let Some(notice) = session.update().access_denied() {
        println!();
        print_notice(notice);
    }
    if pending {
        println!("Verification pending for the current course page");
    }
    Ok(())
}

fn print_notice(notice: &AccessDeniedNotice) {
    println!("{}", notice.title);
    println!("{}", notice.subtitle);
    println!("{}", notice.description);
    println!("{}: {}", notice.contact_label, notice.contact_url);
}

fn describe_update(update: &GateUpdate) -> String {
    let mut flags = Vec::new();
    if update.show_loading {
        flags.push("loading");
    }
    if update.scroll_locked {
        flags.push("scroll locked");
    }
    if update.load_failed {
        flags.push("load failed");
    }
    if update.blocked {
        flags.push("blocked");
    }
    format!(
        "[{:?}] chrome {}{}{}",
        update.page,
        if update.chrome_visible { "shown" } else { "hidden" },
        if flags.is_empty() { "" } else { ", " },
        flags.join(", ")
    )
}

/// Counters from one watch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchSummary {
    pub observations: usize,
    pub skipped: usize,
    pub verifications: usize,
}

async fn sleep_until_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}

/// Drive a session from a line-oriented feed until it closes.
///
/// Malformed lines are logged and skipped. A pending verification fires when
/// its deadline passes, even while the feed is idle.
pub async fn run_watch<R>(
    session: &mut CourseSession,
    reader: R,
    json_mode: bool,
) -> Result<WatchSummary, HilochError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut summary = WatchSummary::default();
    let mut was_blocked = session.update().blocked;

    loop {
        let deadline = session.next_deadline();
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.map_err(|e| HilochError::IoError(e.to_string()))? else {
                    break;
                };
                match parse_observation_line(&line) {
                    Ok(Some(obs)) => {
                        summary.observations += 1;
                        let update = session.observe(&obs, Instant::now());
                        if json_mode {
                            println!(
                                "{}",
                                serde_json::json!({ "event": "update", "url": obs.url, "update": update })
                            );
                        } else {
                            println!("{}  {}", obs.url, describe_update(&update));
                            if let (false, Some(notice)) = (was_blocked, update.access_denied()) {
                                print_notice(notice);
                            }
                        }
                        was_blocked = update.blocked;
                    }
                    Ok(None) => {}
                    Err(e) => {
                        summary.skipped += 1;
                        tracing::warn!(error = %e, "skipping malformed observation");
                    }
                }
            }
            () = sleep_until_deadline(deadline) => {
                if let Some(request) = session.tick(Instant::now()) {
                    summary.verifications += 1;
                    if json_mode {
                        println!(
                            "{}",
                            serde_json::json!({ "event": "verify", "url": request.page.as_str() })
                        );
                    } else {
                        println!("verify {}", request.page.as_str());
                    }
                }
            }
        }
    }

    Ok(summary)
}

/// Watch a live observation feed on stdin.
pub async fn cmd_gate_watch(config: &AppConfig, json_mode: bool) -> Result<(), HilochError> {
    let mut session = config.session();
    tracing::info!(
        course_url = %config.course.url,
        verification = session.verifies_pages(),
        "watching navigation feed on stdin"
    );

    let reader = BufReader::new(tokio::io::stdin());
    let summary = tokio::select! {
        result = run_watch(&mut session, reader, json_mode) => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupted");
            return Ok(());
        }
    };

    tracing::info!(
        observations = summary.observations,
        skipped = summary.skipped,
        verifications = summary.verifications,
        "navigation feed closed"
    );
    Ok(())
}

// =============================================================================
// EXPENSE COMMANDS
// =============================================================================

/// List expenses, newest first.
pub fn cmd_expenses_list(config: &AppConfig, json_mode: bool) -> Result<(), HilochError> {
    let ledger = config.open_profile()?.ledger();
    let expenses = ledger.newest_first();

    if json_mode {
        print_json(&serde_json::json!({
            "expenses": expenses,
            "total": format_amount(ledger.total()),
        }));
        return Ok(());
    }

    if expenses.is_empty() {
        println!("No expenses recorded.");
        return Ok(());
    }

    for expense in &expenses {
        println!(
            "{}  {:>12}  {}  [{}]",
            format_display_date(expense.date),
            format_amount(expense.amount),
            expense.kind,
            expense.id
        );
    }
    println!();
    println!("Total: {}", format_amount(ledger.total()));
    Ok(())
}

/// Record an expense.
pub fn cmd_expenses_add(
    config: &AppConfig,
    json_mode: bool,
    kind: &str,
    amount: &str,
    date: Option<&str>,
) -> Result<(), HilochError> {
    let today = resolve_today(None)?;
    let draft = ExpenseDraft {
        kind: kind.to_string(),
        amount: amount.to_string(),
        date: match date {
            Some(raw) => parse_date(raw)?,
            None => today,
        },
    };
    let mut profile = config.open_profile()?;
    let expense = profile.add_expense(&draft, today, Utc::now().timestamp_millis())?;

    if json_mode {
        print_json(&serde_json::json!({ "success": true, "expense": expense }));
    } else {
        println!(
            "Recorded {} for {} on {} (id {})",
            format_amount(expense.amount),
            expense.kind,
            format_display_date(expense.date),
            expense.id
        );
    }
    Ok(())
}

/// Delete an expense.
pub fn cmd_expenses_delete(config: &AppConfig, json_mode: bool, id: &str) -> Result<(), HilochError> {
    let mut profile = config.open_profile()?;
    let removed = profile.delete_expense(id)?;

    if json_mode {
        print_json(&serde_json::json!({ "success": true, "expense": removed }));
    } else {
        println!("Deleted {} ({})", removed.kind, format_amount(removed.amount));
    }
    Ok(())
}

/// Show the total spent.
pub fn cmd_expenses_total(config: &AppConfig, json_mode: bool) -> Result<(), HilochError> {
    let ledger = config.open_profile()?.ledger();

    if json_mode {
        print_json(&serde_json::json!({
            "count": ledger.len(),
            "total": format_amount(ledger.total()),
        }));
    } else {
        println!("{} expenses, total {}", ledger.len(), format_amount(ledger.total()));
    }
    Ok(())
}

/// List the suggested expense types.
pub fn cmd_expenses_types(json_mode: bool) -> Result<(), HilochError> {
    if json_mode {
        print_json(&serde_json::json!({ "types": EXPENSE_TYPES }));
    } else {
        for kind in EXPENSE_TYPES {
            println!("{}", kind);
        }
    }
    Ok(())
}
