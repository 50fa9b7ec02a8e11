//! Data models for feed entries, the per-date cache, and the daily report.
//!
//! This module defines the record shapes persisted to disk:
//! - [`NewsEntry`]: one normalized feed item
//! - [`DailyCache`]: the per-date collection written by the collector
//! - [`Report`]: the categorized derivative written by the report generator
//! - [`CategoryGroup`], [`CategorizedItem`], [`KeywordSignal`]: report parts
//!
//! All timestamps serialize as RFC 3339 strings and dates as `YYYY-MM-DD`,
//! so the JSON files stay readable by non-Rust consumers.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One normalized news item extracted from a feed.
///
/// `published_local` is `published_at` shifted to the fixed UTC+8 offset,
/// and `date` is the calendar day of `published_local`. The `date` field is
/// the only key used for grouping entries into daily caches.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct NewsEntry {
    /// Stable identifier of the source this entry came from.
    pub source_id: String,
    /// Display name of the source.
    pub source: String,
    /// Item title; a placeholder when the feed carried none.
    pub title: String,
    /// Item summary; empty when the feed carried none.
    pub summary: String,
    /// Publish instant in UTC.
    pub published_at: DateTime<Utc>,
    /// Publish instant shifted to UTC+8.
    pub published_local: DateTime<FixedOffset>,
    /// Calendar day of `published_local`; the grouping key.
    pub date: NaiveDate,
    /// Link to the original article. Empty if the feed carried none.
    pub url: String,
}

/// The per-date entry collection persisted as `<date>.json`.
///
/// Created (or overwritten) by the collector and consumed read-only by the
/// report generator. `items` are sorted by `published_local` descending.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DailyCache {
    pub date: NaiveDate,
    pub generated_at: DateTime<FixedOffset>,
    /// Number of distinct `source_id` values present in `items`.
    pub source_count: usize,
    /// Length of `items`.
    pub item_count: usize,
    pub items: Vec<NewsEntry>,
}

/// One item inside a report category (a [`NewsEntry`] minus the grouping
/// fields, plus the derived insight string).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CategorizedItem {
    pub title: String,
    /// Summary preferred over title, truncated to 160 chars with a `"..."`
    /// marker when longer.
    pub insight: String,
    pub source: String,
    pub url: String,
    pub published_local: DateTime<FixedOffset>,
}

/// A report category with its classified items.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CategoryGroup {
    pub id: String,
    pub name: String,
    pub items: Vec<CategorizedItem>,
}

/// A keyword-bank topic with its mention count and derived heat label
/// ("high" for 3+, "medium" for 2, "low" for 1; zero-count topics are
/// omitted from reports entirely).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct KeywordSignal {
    pub name: String,
    pub heat: String,
    pub count: usize,
}

/// The categorized daily report persisted as `<date>.report.json`.
///
/// Regenerating a report overwrites the previous file; there are no update
/// semantics.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Report {
    pub date: NaiveDate,
    pub generated_at: DateTime<FixedOffset>,
    pub source_count: usize,
    pub item_count: usize,
    /// Up to three "source: title" highlight strings.
    pub takeaways: Vec<String>,
    /// Categories present in the cache, sorted by item count descending.
    pub categories: Vec<CategoryGroup>,
    /// Non-zero keyword signals in keyword-bank declaration order.
    pub keywords: Vec<KeywordSignal>,
    /// Distinct source display names, alphabetical.
    pub sources: Vec<String>,
    /// Category display label -> item count.
    pub stats: BTreeMap<String, usize>,
}

/// Summary of all cached dates, printed by `collect --date-range`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DateRangeSummary {
    pub dates: Vec<NaiveDate>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    /// Number of configured sources (not the number that responded).
    pub source_total: usize,
    /// Total entries across all dates.
    pub items: usize,
}
