//! Report synthesis: classify a cached day's items by keyword rules, count
//! keyword-bank mentions, and build the structured daily report.
//!
//! Classification is total and deterministic: every item lands in exactly
//! one of the seven categories, with "market" as the explicit fallback when
//! no rule matches. Rule order matters; earlier rules win when several
//! match the same text.
//!
//! # Exit Codes
//!
//! - `0`: report written
//! - `1`: the requested date has no cache file

use crate::cli::ReportArgs;
use crate::config::{
    CATEGORY_RULES, FALLBACK_CATEGORY, INSIGHT_KEPT_CHARS, INSIGHT_MAX_CHARS, KEYWORD_BANK,
    TAKEAWAY_LIMIT, TARGET_TZ, category_label,
};
use crate::models::{
    CategorizedItem, CategoryGroup, DailyCache, KeywordSignal, NewsEntry, Report,
};
use crate::outputs::json;
use crate::utils::ensure_writable_dir;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use itertools::Itertools;
use std::collections::BTreeMap;
use std::error::Error;
use tracing::{error, info};

/// Classify free text into a category id. First matching rule wins;
/// unmatched text falls back to "market".
pub fn detect_category(text: &str) -> &'static str {
    let lowered = text.to_lowercase();
    for rule in CATEGORY_RULES {
        if rule.keywords.iter().any(|keyword| lowered.contains(keyword)) {
            return rule.id;
        }
    }
    FALLBACK_CATEGORY
}

/// Build the one-line insight for an entry: summary preferred over title,
/// truncated to 157 chars plus `"..."` when longer than 160 chars.
pub fn build_insight(entry: &NewsEntry) -> String {
    let basis = if entry.summary.is_empty() {
        entry.title.trim()
    } else {
        entry.summary.trim()
    };
    if basis.chars().count() > INSIGHT_MAX_CHARS {
        let kept: String = basis.chars().take(INSIGHT_KEPT_CHARS).collect();
        format!("{kept}...")
    } else {
        basis.to_string()
    }
}

fn heat_label(count: usize) -> &'static str {
    if count >= 3 {
        "high"
    } else if count == 2 {
        "medium"
    } else {
        "low"
    }
}

/// Count keyword-bank mentions across items and derive heat signals.
/// Zero-count topics are omitted; output keeps bank declaration order.
pub fn extract_keywords(items: &[NewsEntry]) -> Vec<KeywordSignal> {
    KEYWORD_BANK
        .iter()
        .filter_map(|topic| {
            let count = items
                .iter()
                .filter(|item| {
                    let text = format!("{} {}", item.title, item.summary).to_lowercase();
                    topic.aliases.iter().any(|alias| text.contains(alias))
                })
                .count();
            (count > 0).then(|| KeywordSignal {
                name: topic.name.to_string(),
                heat: heat_label(count).to_string(),
                count,
            })
        })
        .collect()
}

/// Format the top takeaways from the cache's recency-sorted items.
pub fn build_takeaways(items: &[NewsEntry], limit: usize) -> Vec<String> {
    items
        .iter()
        .take(limit)
        .map(|item| format!("{}: {}", item.source, item.title))
        .collect()
}

/// Generate the report for one cached date.
///
/// Categories are sorted by item count descending; ties keep rule
/// declaration order (stable sort over the rule-ordered groups), which
/// makes the output reproducible for identical input.
pub fn generate(
    date: NaiveDate,
    cache: &DailyCache,
    generated_at: DateTime<FixedOffset>,
) -> Report {
    let mut groups: Vec<CategoryGroup> = CATEGORY_RULES
        .iter()
        .map(|rule| CategoryGroup {
            id: rule.id.to_string(),
            name: rule.label.to_string(),
            items: Vec::new(),
        })
        .collect();

    for item in &cache.items {
        let text = format!("{} {}", item.title, item.summary);
        let category = detect_category(&text);
        if let Some(group) = groups.iter_mut().find(|g| g.id == category) {
            group.items.push(CategorizedItem {
                title: item.title.clone(),
                insight: build_insight(item),
                source: item.source.clone(),
                url: item.url.clone(),
                published_local: item.published_local,
            });
        }
    }

    groups.retain(|group| !group.items.is_empty());
    for group in &mut groups {
        group
            .items
            .sort_by(|a, b| b.published_local.cmp(&a.published_local));
    }
    groups.sort_by(|a, b| b.items.len().cmp(&a.items.len()));

    let stats: BTreeMap<String, usize> = groups
        .iter()
        .map(|group| (category_label(&group.id).to_string(), group.items.len()))
        .collect();
    let sources: Vec<String> = cache
        .items
        .iter()
        .map(|item| item.source.clone())
        .filter(|source| !source.is_empty())
        .unique()
        .sorted()
        .collect();

    Report {
        date,
        generated_at,
        source_count: cache.source_count,
        item_count: cache.item_count,
        takeaways: build_takeaways(&cache.items, TAKEAWAY_LIMIT),
        categories: groups,
        keywords: extract_keywords(&cache.items),
        sources,
        stats,
    }
}

/// Run the report generator end to end. Returns the process exit code.
pub async fn run(args: &ReportArgs) -> Result<i32, Box<dyn Error>> {
    let Some(cache) = json::read_cache(&args.storage_dir, args.date).await? else {
        error!(
            date = %args.date,
            storage_dir = %args.storage_dir,
            "cache file not found; run `pharma_daily collect` first"
        );
        return Ok(1);
    };

    let report = generate(args.date, &cache, Utc::now().with_timezone(&*TARGET_TZ));

    ensure_writable_dir(&args.storage_dir).await?;
    let path = json::write_report(&report, &args.storage_dir).await?;
    info!(path = %path.display(), items = report.item_count, "saved report");

    if args.public {
        ensure_writable_dir(&args.public_dir).await?;
        let public_path = json::write_report(&report, &args.public_dir).await?;
        info!(path = %public_path.display(), "copied report to public directory");
    }

    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(source: &str, title: &str, summary: &str, hour: u32) -> NewsEntry {
        let published_local = TARGET_TZ.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap();
        NewsEntry {
            source_id: source.to_lowercase(),
            source: source.to_string(),
            title: title.to_string(),
            summary: summary.to_string(),
            published_at: published_local.with_timezone(&Utc),
            published_local,
            date: published_local.date_naive(),
            url: format!("https://example.com/{}", title.len()),
        }
    }

    fn cache_of(mut items: Vec<NewsEntry>) -> DailyCache {
        items.sort_by(|a, b| b.published_local.cmp(&a.published_local));
        DailyCache {
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            generated_at: TARGET_TZ.with_ymd_and_hms(2024, 5, 1, 23, 0, 0).unwrap(),
            source_count: items.iter().map(|i| i.source_id.clone()).unique().count(),
            item_count: items.len(),
            items,
        }
    }

    #[test]
    fn test_detect_category_first_rule_wins() {
        // "approval" (regulatory) and "trial" (clinical) both match; the
        // regulatory rule is declared first.
        assert_eq!(detect_category("approval after a pivotal trial"), "regulatory");
        // "trial" (clinical) beats "launch" per declaration order.
        assert_eq!(detect_category("launches phase 3 trial"), "clinical");
    }

    #[test]
    fn test_detect_category_fallback_is_market() {
        assert_eq!(detect_category("nothing relevant here"), "market");
        assert_eq!(detect_category(""), "market");
    }

    #[test]
    fn test_detect_category_is_case_insensitive() {
        assert_eq!(detect_category("FDA Approves Drug"), "regulatory");
        assert_eq!(detect_category("新药获批准"), "regulatory");
    }

    #[test]
    fn test_insight_prefers_summary_and_truncates() {
        let long = entry("S", "t", &"a".repeat(200), 9);
        let insight = build_insight(&long);
        assert_eq!(insight.chars().count(), 160);
        assert!(insight.ends_with("..."));

        let short = entry("S", "t", &"b".repeat(100), 9);
        assert_eq!(build_insight(&short), "b".repeat(100));

        let titled = entry("S", "only title", "", 9);
        assert_eq!(build_insight(&titled), "only title");
    }

    #[test]
    fn test_insight_truncation_counts_chars_not_bytes() {
        let cjk = "药".repeat(200);
        let insight = build_insight(&entry("S", "t", &cjk, 9));
        assert_eq!(insight.chars().count(), 160);
        assert!(insight.ends_with("..."));
    }

    #[test]
    fn test_keyword_heat_thresholds() {
        let items = vec![
            entry("A", "Pfizer update", "", 9),
            entry("A", "pfizer again", "", 10),
            entry("A", "PFIZER once more", "", 11),
            entry("B", "Moderna shot", "", 12),
            entry("B", "moderna data", "", 13),
            entry("C", "Takeda deal", "", 14),
        ];
        let signals = extract_keywords(&items);
        let by_name: BTreeMap<&str, &KeywordSignal> =
            signals.iter().map(|s| (s.name.as_str(), s)).collect();

        assert_eq!(by_name["辉瑞 Pfizer"].heat, "high");
        assert_eq!(by_name["辉瑞 Pfizer"].count, 3);
        assert_eq!(by_name["莫德纳 Moderna"].heat, "medium");
        assert_eq!(by_name["武田 Takeda"].heat, "low");
        // zero-count topics are absent
        assert!(!by_name.contains_key("GLP-1"));
    }

    #[test]
    fn test_keywords_keep_bank_order_not_count_order() {
        let items = vec![
            entry("A", "Takeda one", "", 9),
            entry("A", "Takeda two", "", 10),
            entry("B", "Pfizer one", "", 11),
        ];
        let signals = extract_keywords(&items);
        let names: Vec<&str> = signals.iter().map(|s| s.name.as_str()).collect();
        // Pfizer is declared before Takeda in the bank despite the lower count.
        assert_eq!(names, vec!["辉瑞 Pfizer", "武田 Takeda"]);
    }

    #[test]
    fn test_takeaways_use_recency_order() {
        let cache = cache_of(vec![
            entry("Alpha", "first", "", 9),
            entry("Beta", "second", "", 12),
            entry("Gamma", "third", "", 15),
            entry("Delta", "fourth", "", 18),
        ]);
        let takeaways = build_takeaways(&cache.items, TAKEAWAY_LIMIT);
        assert_eq!(
            takeaways,
            vec!["Delta: fourth", "Gamma: third", "Beta: second"]
        );
    }

    #[test]
    fn test_worked_example() {
        let cache = cache_of(vec![
            entry("FiercePharma", "FDA approves new RSV vaccine", "", 15),
            entry("Endpoints News", "Pfizer launches Phase 3 trial", "", 12),
            entry("PharmaTimes", "Moderna raises $200M Series B", "", 9),
        ]);
        let report = generate(cache.date, &cache, cache.generated_at);

        assert_eq!(report.item_count, 3);
        assert_eq!(report.source_count, 3);
        assert_eq!(report.stats["Regulatory Decisions / 监管审批"], 1);
        assert_eq!(report.stats["Clinical Trials / 临床试验"], 1);
        assert_eq!(report.stats["Financing / 投融资"], 1);

        // All counts tie at 1: stable sort keeps rule declaration order.
        let ids: Vec<&str> = report.categories.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["regulatory", "clinical", "financing"]);

        // "trial" matches the clinical rule before the launch rule is reached.
        assert_eq!(report.categories[1].items[0].title, "Pfizer launches Phase 3 trial");

        // RSV and Pfizer and Moderna each mentioned once.
        let names: Vec<&str> = report.keywords.iter().map(|k| k.name.as_str()).collect();
        assert_eq!(names, vec!["辉瑞 Pfizer", "莫德纳 Moderna", "RSV疫苗"]);
        assert!(report.keywords.iter().all(|k| k.heat == "low" && k.count == 1));

        assert_eq!(
            report.takeaways,
            vec![
                "FiercePharma: FDA approves new RSV vaccine",
                "Endpoints News: Pfizer launches Phase 3 trial",
                "PharmaTimes: Moderna raises $200M Series B",
            ]
        );
        assert_eq!(
            report.sources,
            vec!["Endpoints News", "FiercePharma", "PharmaTimes"]
        );
    }

    #[test]
    fn test_categories_sorted_by_count_descending() {
        let cache = cache_of(vec![
            entry("A", "market forecast one", "", 9),
            entry("A", "market outlook two", "", 10),
            entry("A", "FDA approval", "", 11),
        ]);
        let report = generate(cache.date, &cache, cache.generated_at);
        let ids: Vec<&str> = report.categories.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["market", "regulatory"]);
    }

    #[test]
    fn test_every_item_classified_exactly_once() {
        let cache = cache_of(vec![
            entry("A", "FDA approval", "", 9),
            entry("A", "unclassifiable gibberish", "", 10),
            entry("B", "supply factory news", "", 11),
        ]);
        let report = generate(cache.date, &cache, cache.generated_at);
        let total: usize = report.categories.iter().map(|c| c.items.len()).sum();
        assert_eq!(total, cache.item_count);
        // unmatched text landed in the market fallback
        assert!(report.categories.iter().any(|c| {
            c.id == "market" && c.items.iter().any(|i| i.title == "unclassifiable gibberish")
        }));
    }

    #[test]
    fn test_category_items_sorted_by_recency() {
        let cache = cache_of(vec![
            entry("A", "FDA approval early", "", 8),
            entry("B", "EMA approval late", "", 20),
        ]);
        let report = generate(cache.date, &cache, cache.generated_at);
        let regulatory = &report.categories[0];
        assert_eq!(regulatory.items[0].title, "EMA approval late");
        assert_eq!(regulatory.items[1].title, "FDA approval early");
    }
}
