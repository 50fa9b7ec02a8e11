//! Process-wide constant configuration.
//!
//! This module holds the immutable tables the pipeline runs on:
//!
//! - [`SOURCES`]: the fixed list of pharma/biotech feed endpoints
//! - [`CATEGORY_RULES`]: ordered keyword rules for report classification
//! - [`KEYWORD_BANK`]: known entities/topics tracked for heat signals
//!
//! All tables are `&'static` data; nothing here is mutable at runtime.

use chrono::FixedOffset;
use once_cell::sync::Lazy;
use std::time::Duration;

/// The fixed reporting timezone (UTC+8). Every entry's calendar date is
/// derived from its publish instant converted to this offset.
pub static TARGET_TZ: Lazy<FixedOffset> =
    Lazy::new(|| FixedOffset::east_opt(8 * 3600).unwrap());

/// Per-request timeout for feed fetches. One attempt per source, no retries.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(25);

/// Placeholder title for feed items that carry none.
pub const UNTITLED_PLACEHOLDER: &str = "(无标题)";

/// Maximum insight length before truncation kicks in.
pub const INSIGHT_MAX_CHARS: usize = 160;
/// Characters kept when truncating, before the `"..."` marker.
pub const INSIGHT_KEPT_CHARS: usize = 157;

/// Number of takeaway lines in a report.
pub const TAKEAWAY_LIMIT: usize = 3;

/// Category id used when no classification rule matches.
pub const FALLBACK_CATEGORY: &str = "market";

/// One external RSS/Atom feed endpoint.
#[derive(Debug)]
pub struct Source {
    pub id: &'static str,
    pub name: &'static str,
    pub url: &'static str,
}

/// The configured feed sources. Fixed; not user-supplied.
pub const SOURCES: &[Source] = &[
    Source {
        id: "fiercepharma",
        name: "FiercePharma",
        url: "https://www.fiercepharma.com/rss",
    },
    Source {
        id: "endpoints",
        name: "Endpoints News",
        url: "https://endpts.com/feed/",
    },
    Source {
        id: "pharmatimes",
        name: "PharmaTimes",
        url: "https://www.pharmatimes.com/rss",
    },
    Source {
        id: "fda-cder",
        name: "FDA CDER",
        url: "https://www.fda.gov/about-fda/contact-fda/stay-informed/rss-feeds/rss-feeds-press-releases",
    },
    Source {
        id: "clinicaltrials",
        name: "ClinicalTrials.gov",
        url: "https://clinicaltrials.gov/ct2/results/rss.xml?recrs=&cond=&term=&type=Results",
    },
];

/// One classification rule: an item matching any keyword belongs to this
/// category. Rules are tested in declaration order; the first hit wins.
#[derive(Debug)]
pub struct CategoryRule {
    pub id: &'static str,
    pub label: &'static str,
    pub keywords: &'static [&'static str],
}

/// Ordered classification rules. The last entry ("market") doubles as the
/// explicit fallback for items no rule matches.
pub const CATEGORY_RULES: &[CategoryRule] = &[
    CategoryRule {
        id: "regulatory",
        label: "Regulatory Decisions / 监管审批",
        keywords: &["fda", "ema", "approval", "approve", "授权", "批准", "cder", "审评"],
    },
    CategoryRule {
        id: "clinical",
        label: "Clinical Trials / 临床试验",
        keywords: &["phase", "trial", "临床", "终点", "randomized", "study"],
    },
    CategoryRule {
        id: "launch",
        label: "Drug Launches / 上市与商业化",
        keywords: &["launch", "commercial", "上市", "营销", "pricing", "市场投放"],
    },
    CategoryRule {
        id: "partnership",
        label: "Partnerships & M&A / 合作并购",
        keywords: &["partnership", "collaboration", "并购", "acquire", "licensing", "交易"],
    },
    CategoryRule {
        id: "financing",
        label: "Financing / 投融资",
        keywords: &["funding", "融资", "raise", "series", "investment"],
    },
    CategoryRule {
        id: "manufacturing",
        label: "Manufacturing & Supply / 产能供应",
        keywords: &["manufacturing", "产能", "生产", "supply", "factory"],
    },
    CategoryRule {
        id: "market",
        label: "Market Outlook / 市场洞察",
        keywords: &["market", "forecast", "outlook", "需求", "趋势"],
    },
];

/// One tracked entity/topic and the lowercase substrings that count as a
/// mention of it.
#[derive(Debug)]
pub struct KeywordTopic {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
}

/// The fixed keyword bank. Report output preserves this declaration order.
pub const KEYWORD_BANK: &[KeywordTopic] = &[
    KeywordTopic { name: "辉瑞 Pfizer", aliases: &["pfizer", "辉瑞"] },
    KeywordTopic { name: "莫德纳 Moderna", aliases: &["moderna"] },
    KeywordTopic { name: "默沙东 Merck", aliases: &["merck", "msd", "keytruda"] },
    KeywordTopic { name: "阿斯利康 AstraZeneca", aliases: &["astrazeneca"] },
    KeywordTopic { name: "礼来 Eli Lilly", aliases: &["eli lilly", "lilly"] },
    KeywordTopic { name: "武田 Takeda", aliases: &["takeda"] },
    KeywordTopic { name: "RSV疫苗", aliases: &["rsv"] },
    KeywordTopic { name: "GLP-1", aliases: &["glp-1", "glp1"] },
];

/// Look up the display label for a category id. Unknown ids resolve to the
/// market label, mirroring the classification fallback.
pub fn category_label(id: &str) -> &'static str {
    CATEGORY_RULES
        .iter()
        .find(|rule| rule.id == id)
        .map(|rule| rule.label)
        .unwrap_or("Market Outlook / 市场洞察")
}
