//! # Hiloch CLI Module
//!
//! The command-line host of the companion core.
//!
//! ## Available Commands
//!
//! - `counter` - Show the accompanied-driving countdown (default)
//! - `date` - Show, set or clear the start date
//! - `gate` - Classify URLs, replay navigation traces, or watch a live feed
//! - `expenses` - Manage the driving expense ledger

mod commands;

use crate::config::{AppConfig, BackendKind, DEFAULT_CONFIG_FILE};
use clap::{Parser, Subcommand};
use hiloch_core::HilochError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Hiloch - accompanied-driving companion
///
/// Counts down the two supervision stages after licensing and gates the
/// course browser's navigation chrome.
#[derive(Parser, Debug)]
#[command(name = "hiloch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the configuration file
    #[arg(short = 'c', long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Path to the database (overrides [storage].database)
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Storage backend (overrides [storage].backend)
    #[arg(short = 'B', long, global = true, value_enum)]
    pub backend: Option<BackendKind>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the countdown for the stored start date
    Counter {
        /// Use this start date instead of the stored one (YYYY-MM-DD)
        #[arg(short, long)]
        start: Option<String>,

        /// Evaluate as of this day instead of today (YYYY-MM-DD)
        #[arg(long)]
        today: Option<String>,
    },

    /// Manage the start date
    Date {
        #[command(subcommand)]
        action: DateAction,
    },

    /// Access gate tools
    Gate {
        #[command(subcommand)]
        action: GateAction,
    },

    /// Manage driving expenses
    Expenses {
        #[command(subcommand)]
        action: ExpenseAction,
    },
}

/// `date` subcommands.
#[derive(Subcommand, Debug)]
pub enum DateAction {
    /// Show the stored start date
    Show,

    /// Store a new start date (not after today)
    Set {
        /// The day the licence fee was paid (YYYY-MM-DD)
        date: String,

        /// Treat this day as today (YYYY-MM-DD)
        #[arg(long)]
        today: Option<String>,
    },

    /// Forget the start date
    Clear,
}

/// `gate` subcommands.
#[derive(Subcommand, Debug)]
pub enum GateAction {
    /// Classify a URL and read its access verdict
    Classify {
        /// URL as reported by the browser
        url: String,
    },

    /// Replay a JSON array of navigation observations
    Replay {
        /// Path to the trace file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Read observations from stdin, one JSON object per line
    Watch,
}

/// `expenses` subcommands.
#[derive(Subcommand, Debug)]
pub enum ExpenseAction {
    /// List expenses, newest first
    List,

    /// Record an expense
    Add {
        /// Expense type (see `expenses types`)
        #[arg(short = 't', long = "type")]
        kind: String,

        /// Amount in shekels
        #[arg(short, long)]
        amount: String,

        /// Payment date (YYYY-MM-DD, defaults to today)
        #[arg(short, long)]
        date: Option<String>,
    },

    /// Delete an expense by id
    Delete {
        /// Expense id
        id: String,
    },

    /// Show the total spent
    Total,

    /// List the suggested expense types
    Types,
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), HilochError> {
    let config = AppConfig::load(&cli.config)?.with_overrides(cli.database, cli.backend);
    let json_mode = cli.json_mode;

    match cli.command {
        Some(Commands::Counter { start, today }) => {
            cmd_counter(&config, json_mode, start.as_deref(), today.as_deref())
        }
        Some(Commands::Date { action }) => match action {
            DateAction::Show => cmd_date_show(&config, json_mode),
            DateAction::Set { date, today } => {
                cmd_date_set(&config, json_mode, &date, today.as_deref())
            }
            DateAction::Clear => cmd_date_clear(&config, json_mode),
        },
        Some(Commands::Gate { action }) => match action {
            GateAction::Classify { url } => cmd_gate_classify(&config, json_mode, &url),
            GateAction::Replay { file } => cmd_gate_replay(&config, json_mode, &file),
            GateAction::Watch => cmd_gate_watch(&config, json_mode).await,
        },
        Some(Commands::Expenses { action }) => match action {
            ExpenseAction::List => cmd_expenses_list(&config, json_mode),
            ExpenseAction::Add { kind, amount, date } => {
                cmd_expenses_add(&config, json_mode, &kind, &amount, date.as_deref())
            }
            ExpenseAction::Delete { id } => cmd_expenses_delete(&config, json_mode, &id),
            ExpenseAction::Total => cmd_expenses_total(&config, json_mode),
            ExpenseAction::Types => cmd_expenses_types(json_mode),
        },
        None => {
            // No subcommand - show the counter by default
            cmd_counter(&config, json_mode, None, None)
        }
    }
}
