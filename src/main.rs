//! # Pharma Daily
//!
//! A two-stage pipeline over pharma & biotech RSS/Atom feeds:
//!
//! 1. **collect**: fetch each configured source, normalize its items,
//!    group them by UTC+8 calendar date, and persist the target date's
//!    entries as a JSON cache file.
//! 2. **report**: load a cached date, classify every item with ordered
//!    keyword rules (seven fixed categories, "market" as fallback), derive
//!    keyword heat signals and top-3 takeaways, and persist a structured
//!    report JSON, optionally duplicated to a public directory.
//!
//! The stages are connected only through the filesystem; each run is an
//! independent process invocation.
//!
//! ## Usage
//!
//! ```sh
//! pharma_daily collect --date 2024-05-01
//! pharma_daily report --date 2024-05-01 --public
//! ```
//!
//! ## Exit Codes
//!
//! - `0`: success
//! - `1`: collect retrieved zero entries / report found no cache file
//! - `2`: collect found no entries for the target date

use clap::Parser;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod collector;
mod config;
mod feed;
mod models;
mod outputs;
mod report;
mod utils;

use cli::{Cli, Command};

#[tokio::main]
async fn main() {
    // --- Tracing init ---
    // Logs go to stderr; stdout is reserved for the JSON payloads the
    // collect subcommand prints (--date-range summary, not-found message).
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let start_time = std::time::Instant::now();
    let result = match &args.command {
        Command::Collect(collect_args) => {
            info!("collector starting up");
            collector::run(collect_args).await
        }
        Command::Report(report_args) => {
            info!(date = %report_args.date, "report generator starting up");
            report::run(report_args).await
        }
    };

    let code = match result {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "run failed");
            1
        }
    };

    let elapsed = start_time.elapsed();
    info!(?elapsed, exit_code = code, "Execution complete");

    if code != 0 {
        std::process::exit(code);
    }
}
