//! Command-line interface definitions.
//!
//! The two pipeline stages are exposed as independent subcommands; they
//! share nothing at runtime except the storage directory.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

/// Command-line arguments for pharma_daily.
///
/// # Examples
///
/// ```sh
/// # Fetch feeds and store today's (UTC+8) cache
/// pharma_daily collect
///
/// # Store a specific date's cache, or inspect what dates are available
/// pharma_daily collect --date 2024-05-01
/// pharma_daily collect --date-range
///
/// # Generate the report, optionally copying it to the public directory
/// pharma_daily report --date 2024-05-01 --public
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch all configured feeds and store the target date's cache
    Collect(CollectArgs),
    /// Generate a categorized report from a cached date
    Report(ReportArgs),
}

#[derive(Args, Debug)]
pub struct CollectArgs {
    /// Target date in YYYY-MM-DD (default: today, UTC+8)
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Print a JSON summary of all cached dates and exit without writing
    #[arg(long)]
    pub date_range: bool,

    /// Directory for per-date cache files
    #[arg(long, default_value = "storage/pharma-news")]
    pub storage_dir: String,
}

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Date in YYYY-MM-DD (its cache file must exist)
    #[arg(long)]
    pub date: NaiveDate,

    /// Also write the report to the public directory
    #[arg(long)]
    pub public: bool,

    /// Directory holding the per-date cache files
    #[arg(long, default_value = "storage/pharma-news")]
    pub storage_dir: String,

    /// Public-facing directory for the optional report copy
    #[arg(long, default_value = "public/pharma-news")]
    pub public_dir: String,
}
