//! # Hiloch - Accompanied Driving Companion
//!
//! The host binary for the Hiloch companion core.
//!
//! This application provides:
//! - The accompanied-driving countdown over the stored start date
//! - Access gate tools for navigation traces (replay and live feed)
//! - The driving expense ledger
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │                apps/hiloch (THE BINARY)               │
//! │                                                       │
//! │  ┌─────────────┐   ┌──────────────┐   ┌───────────┐   │
//! │  │    CLI      │   │  Watch loop  │   │  Config   │   │
//! │  │   (clap)    │   │   (tokio)    │   │  (toml)   │   │
//! │  └──────┬──────┘   └──────┬───────┘   └─────┬─────┘   │
//! │         └─────────────────┼─────────────────┘         │
//! │                           ▼                           │
//! │                   ┌───────────────┐                   │
//! │                   │  hiloch-core  │                   │
//! │                   │  (THE LOGIC)  │                   │
//! │                   └───────────────┘                   │
//! └───────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! hiloch date set 2024-01-01
//! hiloch counter
//! hiloch gate replay -f trace.json
//! hiloch expenses add --type "שיעור נהיגה" --amount 180
//! ```

use clap::Parser;
use hiloch::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    // HILOCH_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("HILOCH_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let default_filter = if cli.verbose {
        "hiloch=debug,hiloch_core=debug"
    } else {
        "hiloch=info,hiloch_core=warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    // Logs go to stderr so stdout stays parseable in --json-mode.
    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the startup banner.
fn print_banner() {
    println!(
        r#"
  Hiloch v{}
  מלווה 24/7 → מלווה לילה
"#,
        env!("CARGO_PKG_VERSION")
    );
}
