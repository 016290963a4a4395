//! # Accompanied-Driving Stages
//!
//! After the licence fee is paid, a new driver goes through two sequential
//! supervision stages:
//!
//! | Stage | Title | Length | Supervision |
//! |-------|-------|--------|-------------|
//! | 1 | מלווה 24/7 | 3 calendar months | Full time |
//! | 2 | מלווה לילה | 3 calendar months | Night only |
//!
//! Everything here is a pure function of a start date and "today". Both are
//! plain calendar dates (`NaiveDate`), so all day differences are exact and
//! the ceiling of a day difference is the difference itself.
//!
//! ## Counting rule
//!
//! The selected day never counts: the effective start is always the day after
//! the selected date. Selecting today therefore shows the full period pending
//! and 0% progress.

use crate::primitives::{
    DISPLAY_DATE_FORMAT, REMINDER_WINDOW_DAYS, STAGE_LENGTH_MONTHS, START_OFFSET_DAYS,
    STORAGE_DATE_FORMAT,
};
use crate::HilochError;
use chrono::{DateTime, Datelike, Days, Local, Months, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

// =============================================================================
// STAGE ENUM
// =============================================================================

/// Where the driver currently is in the accompanied-driving period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Full-time supervision.
    Stage1,
    /// Night-only supervision.
    Stage2,
    /// The period is over.
    Completed,
}

impl Stage {
    /// Hebrew title shown on the counter.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Stage1 => "מלווה 24/7",
            Stage::Stage2 => "מלווה לילה",
            Stage::Completed => "הושלם",
        }
    }

    /// Get the next stage, if any.
    #[must_use]
    pub fn next(&self) -> Option<Stage> {
        match self {
            Stage::Stage1 => Some(Stage::Stage2),
            Stage::Stage2 => Some(Stage::Completed),
            Stage::Completed => None,
        }
    }

    /// Check if this stage is terminal.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Completed)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Stage1 => write!(f, "1: {}", self.name()),
            Stage::Stage2 => write!(f, "2: {}", self.name()),
            Stage::Completed => f.write_str(self.name()),
        }
    }
}

// =============================================================================
// STAGE WINDOW
// =============================================================================

/// Stage boundaries derived from a start date. Immutable per calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageWindow {
    /// Selected date plus one day.
    pub effective_start: NaiveDate,
    /// End of stage 1 (effective start + 3 months).
    pub stage1_end: NaiveDate,
    /// End of stage 2 (stage 1 end + 3 months).
    pub stage2_end: NaiveDate,
    pub stage1_total_days: u32,
    pub stage2_total_days: u32,
}

impl StageWindow {
    /// Length of the whole period in days.
    #[must_use]
    pub fn total_days(&self) -> u32 {
        self.stage1_total_days.saturating_add(self.stage2_total_days)
    }
}

/// Compute the stage boundaries for a start date.
///
/// Month arithmetic is calendar based: three months after 2024-01-02 is
/// 2024-04-02, whatever the month lengths in between. A day that does not
/// exist in the target month rolls over into the next one, so three months
/// after 2023-11-30 is 2024-03-01.
#[must_use]
pub fn compute_stage_window(start: NaiveDate) -> StageWindow {
    let effective_start = start
        .checked_add_days(Days::new(START_OFFSET_DAYS))
        .unwrap_or(NaiveDate::MAX);
    let stage1_end = add_stage(effective_start);
    let stage2_end = add_stage(stage1_end);

    StageWindow {
        effective_start,
        stage1_end,
        stage2_end,
        stage1_total_days: days_between(effective_start, stage1_end),
        stage2_total_days: days_between(stage1_end, stage2_end),
    }
}

/// Add one stage length, counting the day of month from the target month's
/// first day.
fn add_stage(from: NaiveDate) -> NaiveDate {
    from.with_day(1)
        .and_then(|first| first.checked_add_months(Months::new(STAGE_LENGTH_MONTHS)))
        .and_then(|first| first.checked_add_days(Days::new(u64::from(from.day0()))))
        .unwrap_or(NaiveDate::MAX)
}

/// Whole days from `from` to `to`, clamped at zero.
fn days_between(from: NaiveDate, to: NaiveDate) -> u32 {
    let days = to.signed_duration_since(from).num_days();
    u32::try_from(days.max(0)).unwrap_or(u32::MAX)
}

// =============================================================================
// COUNTDOWN STATE
// =============================================================================

/// The countdown as seen on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountdownState {
    pub stage1_remaining: u32,
    pub stage2_remaining: u32,
    /// Days until the end of stage 2.
    pub total_remaining: u32,
    pub current_stage: Stage,
    /// The start date is today: nothing has been counted yet.
    pub is_today: bool,
    pub show_reminder: bool,
}

impl CountdownState {
    /// Stage 1 is over and the counter has moved past it.
    #[must_use]
    pub fn is_stage1_complete(&self) -> bool {
        self.stage1_remaining == 0 && self.current_stage != Stage::Stage1
    }

    /// The whole period is over.
    #[must_use]
    pub fn is_stage2_complete(&self) -> bool {
        self.stage2_remaining == 0 && self.current_stage == Stage::Completed
    }
}

/// Evaluate the countdown for `today`.
///
/// Selecting today is a special case: both stages report their full length,
/// the current stage is 1 and the reminder stays off, since the period has not
/// begun.
#[must_use]
pub fn compute_countdown(window: &StageWindow, start: NaiveDate, today: NaiveDate) -> CountdownState {
    if start == today {
        return CountdownState {
            stage1_remaining: window.stage1_total_days,
            stage2_remaining: window.stage2_total_days,
            total_remaining: window.total_days(),
            current_stage: Stage::Stage1,
            is_today: true,
            show_reminder: false,
        };
    }

    let total_remaining = days_between(today, window.stage2_end);

    let (current_stage, stage1_remaining, stage2_remaining) = if today < window.stage1_end {
        // Stage 2 has not started yet, all of it is still ahead.
        (
            Stage::Stage1,
            days_between(today, window.stage1_end),
            window.stage2_total_days,
        )
    } else if today < window.stage2_end {
        (Stage::Stage2, 0, total_remaining)
    } else {
        (Stage::Completed, 0, 0)
    };

    CountdownState {
        stage1_remaining,
        stage2_remaining,
        total_remaining,
        current_stage,
        is_today: false,
        show_reminder: should_remind(total_remaining),
    }
}

/// The reminder shows in the last `REMINDER_WINDOW_DAYS` days, never after.
#[must_use]
pub fn should_remind(total_remaining: u32) -> bool {
    total_remaining > 0 && total_remaining <= REMINDER_WINDOW_DAYS
}

// =============================================================================
// PROGRESS
// =============================================================================

/// Encouragement shown next to the current stage's progress ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Motivation {
    JustStarted,
    OnTheWay,
    PastHalfway,
    AlmostThere,
    Finished,
}

impl Motivation {
    /// Pick the message tier for a stage and its progress.
    #[must_use]
    pub fn for_progress(stage: Stage, percent: u8) -> Self {
        if stage.is_terminal() {
            return Motivation::Finished;
        }
        match percent {
            0..=24 => Motivation::JustStarted,
            25..=49 => Motivation::OnTheWay,
            50..=74 => Motivation::PastHalfway,
            _ => Motivation::AlmostThere,
        }
    }

    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            Motivation::JustStarted => "התחלה מצוינת! המשך כך",
            Motivation::OnTheWay => "אתה בדרך! המשך להתקדם",
            Motivation::PastHalfway => "יותר ממחצית הדרך! כל הכבוד",
            Motivation::AlmostThere => "כמעט שם! עוד קצת",
            Motivation::Finished => "כל הכבוד! סיימת את תקופת הליווי",
        }
    }
}

/// Render data for the progress rings. Percentages are whole numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageProgress {
    pub stage1_percent: u8,
    pub stage2_percent: u8,
    pub overall_percent: u8,
    pub current_stage_percent: u8,
    pub days_completed: u32,
    /// End date of the stage in progress (stage 2 end once completed).
    pub current_end_date: NaiveDate,
    pub motivation: Motivation,
}

impl StageProgress {
    #[must_use]
    pub fn from_countdown(window: &StageWindow, countdown: &CountdownState) -> Self {
        let (stage1_percent, stage2_percent) = if countdown.is_today {
            (0, 0)
        } else {
            (
                percent(window.stage1_total_days, countdown.stage1_remaining),
                percent(window.stage2_total_days, countdown.stage2_remaining),
            )
        };

        let days_completed = window
            .stage1_total_days
            .saturating_sub(countdown.stage1_remaining)
            .saturating_add(
                window
                    .stage2_total_days
                    .saturating_sub(countdown.stage2_remaining),
            );
        let overall_percent = percent(
            window.total_days(),
            window.total_days().saturating_sub(days_completed),
        );

        let (current_stage_percent, current_end_date) = match countdown.current_stage {
            Stage::Stage1 => (stage1_percent, window.stage1_end),
            Stage::Stage2 => (stage2_percent, window.stage2_end),
            Stage::Completed => (100, window.stage2_end),
        };

        Self {
            stage1_percent,
            stage2_percent,
            overall_percent,
            current_stage_percent,
            days_completed,
            current_end_date,
            motivation: Motivation::for_progress(countdown.current_stage, current_stage_percent),
        }
    }
}

/// Percentage of `total` already behind, integer math only.
fn percent(total: u32, remaining: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let done = u64::from(total.saturating_sub(remaining));
    (done.saturating_mul(100) / u64::from(total)).min(100) as u8
}

// =============================================================================
// COUNTDOWN REPORT
// =============================================================================

/// Everything the counter screen renders for one start date on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountdownReport {
    pub start: NaiveDate,
    pub today: NaiveDate,
    pub window: StageWindow,
    pub countdown: CountdownState,
    pub progress: StageProgress,
}

impl CountdownReport {
    #[must_use]
    pub fn evaluate(start: NaiveDate, today: NaiveDate) -> Self {
        let window = compute_stage_window(start);
        let countdown = compute_countdown(&window, start, today);
        let progress = StageProgress::from_countdown(&window, &countdown);
        Self {
            start,
            today,
            window,
            countdown,
            progress,
        }
    }
}

// =============================================================================
// DATE FORMATS
// =============================================================================

/// Format a date as `DD/MM/YYYY`.
#[must_use]
pub fn format_display_date(date: NaiveDate) -> String {
    date.format(DISPLAY_DATE_FORMAT).to_string()
}

/// Format a date for storage (`YYYY-MM-DD`).
#[must_use]
pub fn format_storage_date(date: NaiveDate) -> String {
    date.format(STORAGE_DATE_FORMAT).to_string()
}

/// Parse a stored or user-entered date in the local time zone.
///
/// See [`parse_date_in`].
pub fn parse_date(input: &str) -> Result<NaiveDate, HilochError> {
    parse_date_in(input, &Local)
}

/// Parse a stored or user-entered date.
///
/// Accepts `YYYY-MM-DD` and RFC 3339 timestamps. A timestamp names an
/// instant, so it is converted to `zone` before the time of day is dropped:
/// `2024-01-01T22:00:00Z` is 2024-01-02 in Israel.
pub fn parse_date_in<Tz: TimeZone>(input: &str, zone: &Tz) -> Result<NaiveDate, HilochError> {
    let trimmed = input.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, STORAGE_DATE_FORMAT) {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.with_timezone(zone).date_naive())
        .map_err(|_| HilochError::InvalidDate(trimmed.to_string()))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn stage_ordering() {
        assert!(Stage::Stage1 < Stage::Stage2);
        assert!(Stage::Stage2 < Stage::Completed);
        assert_eq!(Stage::Stage1.next(), Some(Stage::Stage2));
        assert_eq!(Stage::Completed.next(), None);
    }

    #[test]
    fn window_uses_calendar_months() {
        let window = compute_stage_window(date(2024, 1, 1));
        assert_eq!(window.effective_start, date(2024, 1, 2));
        assert_eq!(window.stage1_end, date(2024, 4, 2));
        assert_eq!(window.stage2_end, date(2024, 7, 2));
        assert_eq!(window.stage1_total_days, 91);
        assert_eq!(window.stage2_total_days, 91);
    }

    #[test]
    fn month_end_rolls_over() {
        // effective start 2023-11-30, February 2024 has no 30th
        let window = compute_stage_window(date(2023, 11, 29));
        assert_eq!(window.effective_start, date(2023, 11, 30));
        assert_eq!(window.stage1_end, date(2024, 3, 1));
        assert_eq!(window.stage2_end, date(2024, 6, 1));
        assert_eq!(window.stage1_total_days, 92);
        assert_eq!(window.stage2_total_days, 92);

        // effective start 2023-08-31, November has 30 days
        let window = compute_stage_window(date(2023, 8, 30));
        assert_eq!(window.stage1_end, date(2023, 12, 1));
    }

    #[test]
    fn selecting_today_is_full_and_quiet() {
        let today = date(2024, 6, 1);
        let report = CountdownReport::evaluate(today, today);

        assert!(report.countdown.is_today);
        assert_eq!(report.countdown.current_stage, Stage::Stage1);
        assert_eq!(report.countdown.stage1_remaining, report.window.stage1_total_days);
        assert_eq!(report.countdown.stage2_remaining, report.window.stage2_total_days);
        assert!(!report.countdown.show_reminder);
        assert_eq!(report.progress.stage1_percent, 0);
        assert_eq!(report.progress.stage2_percent, 0);
        assert_eq!(report.progress.overall_percent, 0);
    }

    #[test]
    fn mid_stage_one() {
        let start = date(2024, 1, 1);
        let report = CountdownReport::evaluate(start, date(2024, 3, 1));

        assert_eq!(report.countdown.current_stage, Stage::Stage1);
        assert_eq!(report.countdown.stage1_remaining, 32);
        assert_eq!(report.countdown.stage2_remaining, 91);
        assert_eq!(report.countdown.total_remaining, 123);
        assert!(!report.countdown.show_reminder);
        assert_eq!(report.progress.current_end_date, date(2024, 4, 2));
    }

    #[test]
    fn stage_two_starts_on_boundary() {
        let start = date(2024, 1, 1);
        let report = CountdownReport::evaluate(start, date(2024, 4, 2));

        assert_eq!(report.countdown.current_stage, Stage::Stage2);
        assert_eq!(report.countdown.stage1_remaining, 0);
        assert_eq!(report.countdown.stage2_remaining, 91);
        assert!(report.countdown.is_stage1_complete());
        assert_eq!(report.progress.stage1_percent, 100);
        assert_eq!(report.progress.stage2_percent, 0);
    }

    #[test]
    fn completed_on_stage_two_end() {
        let start = date(2024, 1, 1);
        let report = CountdownReport::evaluate(start, date(2024, 7, 2));

        assert_eq!(report.countdown.current_stage, Stage::Completed);
        assert_eq!(report.countdown.stage1_remaining, 0);
        assert_eq!(report.countdown.stage2_remaining, 0);
        assert!(!report.countdown.show_reminder);
        assert!(report.countdown.is_stage2_complete());
        assert_eq!(report.progress.overall_percent, 100);
        assert_eq!(report.progress.motivation, Motivation::Finished);
    }

    #[test]
    fn reminder_window_edges() {
        assert!(!should_remind(0));
        assert!(should_remind(1));
        assert!(should_remind(30));
        assert!(!should_remind(31));
    }

    #[test]
    fn future_start_does_not_panic() {
        let start = date(2024, 5, 1);
        let report = CountdownReport::evaluate(start, date(2024, 4, 1));
        assert_eq!(report.countdown.current_stage, Stage::Stage1);
        assert!(report.countdown.stage1_remaining > report.window.stage1_total_days);
        assert_eq!(report.progress.stage1_percent, 0);
    }

    #[test]
    fn motivation_tiers() {
        assert_eq!(Motivation::for_progress(Stage::Stage1, 0), Motivation::JustStarted);
        assert_eq!(Motivation::for_progress(Stage::Stage1, 25), Motivation::OnTheWay);
        assert_eq!(Motivation::for_progress(Stage::Stage2, 74), Motivation::PastHalfway);
        assert_eq!(Motivation::for_progress(Stage::Stage2, 75), Motivation::AlmostThere);
        assert_eq!(Motivation::for_progress(Stage::Completed, 0), Motivation::Finished);
    }

    #[test]
    fn display_date_is_zero_padded() {
        assert_eq!(format_display_date(date(2024, 3, 5)), "05/03/2024");
        assert_eq!(format_display_date(date(2025, 12, 31)), "31/12/2025");
    }

    #[test]
    fn parse_accepts_plain_and_timestamp() {
        let utc = chrono::Utc;
        assert_eq!(parse_date_in("2024-01-01", &utc).expect("plain"), date(2024, 1, 1));
        assert_eq!(
            parse_date_in("2024-01-01T10:30:00.000Z", &utc).expect("rfc3339"),
            date(2024, 1, 1)
        );
        assert!(matches!(
            parse_date_in("01/01/2024", &utc),
            Err(HilochError::InvalidDate(_))
        ));
        assert!(parse_date("2024-01-01").is_ok());
    }

    #[test]
    fn timestamp_uses_calendar_date_of_zone() {
        let israel = chrono::FixedOffset::east_opt(2 * 3600).expect("offset");
        // Local midnight and 01:00 on 2024-01-02, stored as UTC instants.
        assert_eq!(
            parse_date_in("2024-01-01T22:00:00.000Z", &israel).expect("midnight"),
            date(2024, 1, 2)
        );
        assert_eq!(
            parse_date_in("2024-01-01T23:00:00.000Z", &israel).expect("one am"),
            date(2024, 1, 2)
        );
        // A plain date is never shifted.
        assert_eq!(parse_date_in("2024-01-02", &israel).expect("plain"), date(2024, 1, 2));

        let start = parse_date_in("2024-01-01T23:00:00.000Z", &israel).expect("start");
        let report = CountdownReport::evaluate(start, date(2024, 1, 2));
        assert!(report.countdown.is_today);
        assert_eq!(report.window.stage1_end, date(2024, 4, 3));
    }

    #[test]
    fn stage_display() {
        assert_eq!(format!("{}", Stage::Stage1), "1: מלווה 24/7");
        assert_eq!(format!("{}", Stage::Completed), "הושלם");
    }
}
