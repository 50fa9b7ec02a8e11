//! Feed collection: fetch every configured source, group entries by their
//! UTC+8 calendar date, and persist the target date's cache file.
//!
//! Sources are fetched sequentially, one attempt each; per-source failures
//! are contained inside [`crate::feed::fetch_source`] and surface here only
//! as empty contributions.
//!
//! # Exit Codes
//!
//! - `0`: cache written (or `--date-range` summary printed)
//! - `1`: zero entries retrieved across all sources
//! - `2`: the target date has no grouped entries

use crate::cli::CollectArgs;
use crate::config::{FETCH_TIMEOUT, SOURCES, TARGET_TZ};
use crate::models::{DailyCache, DateRangeSummary, NewsEntry};
use crate::outputs::json;
use crate::utils::{ensure_writable_dir, today_local};
use crate::feed;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use itertools::Itertools;
use std::collections::BTreeMap;
use std::error::Error;
use tracing::{error, info, instrument};

/// Fetch all configured sources in order and return the combined entries.
#[instrument(level = "info", skip_all)]
pub async fn collect_entries(client: &reqwest::Client) -> Vec<NewsEntry> {
    let mut all = Vec::new();
    for source in SOURCES {
        let entries = feed::fetch_source(client, source).await;
        info!(source = source.name, count = entries.len(), "collected source");
        all.extend(entries);
    }
    all
}

/// Group entries by their derived calendar date (the `date` field, which is
/// the calendar day of `published_local`).
pub fn partition_by_date(entries: Vec<NewsEntry>) -> BTreeMap<NaiveDate, Vec<NewsEntry>> {
    let mut grouped: BTreeMap<NaiveDate, Vec<NewsEntry>> = BTreeMap::new();
    for entry in entries {
        grouped.entry(entry.date).or_default().push(entry);
    }
    grouped
}

/// Materialize one date group into a [`DailyCache`]: items sorted by
/// `published_local` descending, counts derived from the items.
pub fn build_cache(
    date: NaiveDate,
    mut entries: Vec<NewsEntry>,
    generated_at: DateTime<FixedOffset>,
) -> DailyCache {
    entries.sort_by(|a, b| b.published_local.cmp(&a.published_local));
    let source_count = entries
        .iter()
        .map(|entry| entry.source_id.as_str())
        .unique()
        .count();
    DailyCache {
        date,
        generated_at,
        source_count,
        item_count: entries.len(),
        items: entries,
    }
}

/// Summarize which dates are present in a grouping.
pub fn date_range_summary(grouped: &BTreeMap<NaiveDate, Vec<NewsEntry>>) -> DateRangeSummary {
    let dates: Vec<NaiveDate> = grouped.keys().copied().collect();
    DateRangeSummary {
        start: dates.first().copied(),
        end: dates.last().copied(),
        source_total: SOURCES.len(),
        items: grouped.values().map(Vec::len).sum(),
        dates,
    }
}

/// Run the collector end to end. Returns the process exit code.
pub async fn run(args: &CollectArgs) -> Result<i32, Box<dyn Error>> {
    let client = reqwest::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .user_agent(concat!("pharma_daily/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let entries = collect_entries(&client).await;
    if entries.is_empty() {
        error!("no entries retrieved from any source");
        return Ok(1);
    }

    let mut grouped = partition_by_date(entries);

    if args.date_range {
        let summary = date_range_summary(&grouped);
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(0);
    }

    let target_date = args.date.unwrap_or_else(today_local);
    let Some(day_entries) = grouped.remove(&target_date) else {
        // Last 5 available dates, ascending.
        let mut available: Vec<NaiveDate> = grouped.keys().rev().take(5).copied().collect();
        available.reverse();
        let message = serde_json::json!({
            "error": format!("No pharma news for {target_date}"),
            "available_dates": available,
        });
        println!("{}", serde_json::to_string_pretty(&message)?);
        return Ok(2);
    };

    ensure_writable_dir(&args.storage_dir).await?;
    let cache = build_cache(target_date, day_entries, Utc::now().with_timezone(&*TARGET_TZ));
    let path = json::write_cache(&cache, &args.storage_dir).await?;
    info!(
        items = cache.item_count,
        sources = cache.source_count,
        path = %path.display(),
        "saved daily cache"
    );
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(source_id: &str, date: (i32, u32, u32), hour: u32) -> NewsEntry {
        let (y, m, d) = date;
        let published_local = TARGET_TZ.with_ymd_and_hms(y, m, d, hour, 0, 0).unwrap();
        NewsEntry {
            source_id: source_id.to_string(),
            source: source_id.to_string(),
            title: format!("{source_id} {hour}"),
            summary: String::new(),
            published_at: published_local.with_timezone(&Utc),
            published_local,
            date: published_local.date_naive(),
            url: String::new(),
        }
    }

    #[test]
    fn test_partition_groups_by_derived_date() {
        let entries = vec![
            entry("a", (2024, 5, 1), 9),
            entry("b", (2024, 5, 1), 12),
            entry("a", (2024, 5, 2), 8),
        ];
        let grouped = partition_by_date(entries);
        assert_eq!(grouped.len(), 2);
        let may_first = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(grouped[&may_first].len(), 2);
    }

    #[test]
    fn test_build_cache_counts_and_sort() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let entries = vec![
            entry("a", (2024, 5, 1), 9),
            entry("b", (2024, 5, 1), 15),
            entry("a", (2024, 5, 1), 12),
        ];
        let generated_at = TARGET_TZ.with_ymd_and_hms(2024, 5, 1, 23, 0, 0).unwrap();
        let cache = build_cache(date, entries, generated_at);

        assert_eq!(cache.item_count, cache.items.len());
        assert_eq!(cache.item_count, 3);
        assert_eq!(cache.source_count, 2);
        // most recent first
        let hours: Vec<u32> = cache
            .items
            .iter()
            .map(|e| chrono::Timelike::hour(&e.published_local))
            .collect();
        assert_eq!(hours, vec![15, 12, 9]);
    }

    #[test]
    fn test_date_range_summary() {
        let grouped = partition_by_date(vec![
            entry("a", (2024, 5, 1), 9),
            entry("a", (2024, 5, 3), 9),
            entry("b", (2024, 5, 3), 10),
        ]);
        let summary = date_range_summary(&grouped);
        assert_eq!(summary.dates.len(), 2);
        assert_eq!(summary.start, NaiveDate::from_ymd_opt(2024, 5, 1));
        assert_eq!(summary.end, NaiveDate::from_ymd_opt(2024, 5, 3));
        assert_eq!(summary.source_total, SOURCES.len());
        assert_eq!(summary.items, 3);
    }

    #[test]
    fn test_date_range_summary_empty() {
        let summary = date_range_summary(&BTreeMap::new());
        assert!(summary.dates.is_empty());
        assert_eq!(summary.start, None);
        assert_eq!(summary.end, None);
        assert_eq!(summary.items, 0);
    }
}
