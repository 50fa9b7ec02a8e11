//! JSON file I/O for caches and reports.
//!
//! Writes are whole-file: a cache or report file only appears after its
//! stage fully succeeded, and regenerating overwrites the previous file.

use crate::models::{DailyCache, Report};
use chrono::NaiveDate;
use serde::Serialize;
use std::error::Error;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

/// Write a [`DailyCache`] to `<dir>/<date>.json`. Returns the path written.
#[instrument(level = "info", skip_all, fields(dir = %dir, date = %cache.date))]
pub async fn write_cache(cache: &DailyCache, dir: &str) -> Result<PathBuf, Box<dyn Error>> {
    let path = Path::new(dir).join(format!("{}.json", cache.date));
    write_pretty(&path, cache).await?;
    info!(path = %path.display(), "wrote daily cache");
    Ok(path)
}

/// Read the [`DailyCache`] for a date, or `None` if no file exists.
pub async fn read_cache(dir: &str, date: NaiveDate) -> Result<Option<DailyCache>, Box<dyn Error>> {
    let path = Path::new(dir).join(format!("{date}.json"));
    let raw = match fs::read_to_string(&path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(Some(serde_json::from_str(&raw)?))
}

/// Write a [`Report`] to `<dir>/<date>.report.json`. Returns the path written.
#[instrument(level = "info", skip_all, fields(dir = %dir, date = %report.date))]
pub async fn write_report(report: &Report, dir: &str) -> Result<PathBuf, Box<dyn Error>> {
    let path = Path::new(dir).join(format!("{}.report.json", report.date));
    write_pretty(&path, report).await?;
    info!(path = %path.display(), "wrote report");
    Ok(path)
}

async fn write_pretty<T: Serialize>(path: &Path, value: &T) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).await?;
    Ok(())
}
