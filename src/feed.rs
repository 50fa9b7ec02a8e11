//! RSS/Atom feed fetching and normalization.
//!
//! One fetch attempt per source with a bounded timeout; a network failure
//! or malformed XML response is logged and contributes zero entries, never
//! aborting the run.
//!
//! # Feed Shapes
//!
//! Item nodes are located under the RSS `item` path first, falling back to
//! the Atom `entry` path only when no RSS items are found. Tag matching is
//! namespace-agnostic: `<content:encoded>` and `<encoded>` are the same tag.

use crate::config::{Source, TARGET_TZ, UNTITLED_PLACEHOLDER};
use crate::models::NewsEntry;
use crate::utils::truncate_for_log;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use quick_xml::Reader;
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesStart, Event};
use std::error::Error;
use tracing::{debug, instrument, warn};

/// Timestamp tags tried in order; the first parseable value wins.
const TIMESTAMP_TAGS: [&str; 4] = ["pubDate", "published", "updated", "date"];
/// Summary tags tried in order; the first non-empty value wins.
const SUMMARY_TAGS: [&str; 4] = ["description", "summary", "content", "encoded"];

/// Fetch one source and normalize its items.
///
/// Both failure modes (HTTP error/timeout and XML parse error) are
/// non-fatal: a warning is logged and an empty vector returned.
#[instrument(level = "info", skip_all, fields(source = source.name))]
pub async fn fetch_source(client: &reqwest::Client, source: &Source) -> Vec<NewsEntry> {
    let body = match request_feed(client, source).await {
        Ok(body) => body,
        Err(e) => {
            warn!(source = source.name, error = %e, "feed fetch failed");
            return Vec::new();
        }
    };

    match parse_feed(&body, source, Utc::now()) {
        Ok(entries) => {
            debug!(source = source.name, count = entries.len(), "parsed feed");
            entries
        }
        Err(e) => {
            warn!(
                source = source.name,
                error = %e,
                body_preview = %truncate_for_log(&body, 200),
                "feed XML parse error"
            );
            Vec::new()
        }
    }
}

async fn request_feed(
    client: &reqwest::Client,
    source: &Source,
) -> Result<String, Box<dyn Error>> {
    let response = client.get(source.url).send().await?.error_for_status()?;
    Ok(response.text().await?)
}

/// Parse a feed body into normalized entries.
///
/// `fetched_at` is used as the publish instant for items with no parseable
/// timestamp; passing it in keeps the function deterministic under test.
pub fn parse_feed(
    xml: &str,
    source: &Source,
    fetched_at: DateTime<Utc>,
) -> Result<Vec<NewsEntry>, Box<dyn Error>> {
    let mut items = scan_items(xml, b"item")?;
    if items.is_empty() {
        items = scan_items(xml, b"entry")?;
    }
    Ok(items
        .iter()
        .map(|item| entry_from_item(item, source, fetched_at))
        .collect())
}

/// Raw field texts captured from a single item node, keyed by local tag
/// name (namespace prefix stripped). Atom `link@href` values are kept
/// separately since they live in an attribute, not element text.
#[derive(Debug, Default)]
struct RawItem {
    fields: Vec<(String, String)>,
    link_hrefs: Vec<String>,
}

impl RawItem {
    /// First non-empty text captured for `tag`.
    fn text(&self, tag: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, value)| name.as_str() == tag && !value.is_empty())
            .map(|(_, value)| value.as_str())
    }

    /// First non-empty text among `tags`, in the order given.
    fn first_text(&self, tags: &[&str]) -> Option<&str> {
        tags.iter().find_map(|tag| self.text(tag))
    }

    /// RSS `link` element text, else the first Atom `link@href`.
    fn link(&self) -> String {
        self.text("link")
            .map(str::to_string)
            .or_else(|| self.link_hrefs.first().cloned())
            .unwrap_or_default()
    }
}

/// Event-driven scan for item nodes with the given local name (`item` or
/// `entry`), capturing the text of each direct child element.
///
/// Nested markup inside a child (e.g. XHTML in an Atom `content` element)
/// contributes its text content; the nested tags themselves are ignored.
fn scan_items(xml: &str, item_tag: &[u8]) -> Result<Vec<RawItem>, Box<dyn Error>> {
    let mut reader = Reader::from_str(xml);

    let mut items: Vec<RawItem> = Vec::new();
    let mut current: Option<RawItem> = None;
    // (field local name, accumulated text, nesting depth inside the field)
    let mut field: Option<(String, String, usize)> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => {
                if current.is_none() {
                    if start.local_name().as_ref() == item_tag {
                        current = Some(RawItem::default());
                    }
                } else if let Some((name, text, depth)) = field.take() {
                    field = Some((name, text, depth + 1));
                } else {
                    let name =
                        String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
                    if name == "link" {
                        if let Some(item) = current.as_mut() {
                            collect_hrefs(&start, item)?;
                        }
                    }
                    field = Some((name, String::new(), 0));
                }
            }
            Event::Empty(start) => {
                if let Some(item) = current.as_mut() {
                    if field.is_none() && start.local_name().as_ref() == b"link" {
                        collect_hrefs(&start, item)?;
                    }
                }
            }
            Event::Text(text) => {
                if let Some((_, buf, _)) = field.as_mut() {
                    buf.push_str(&text.xml_content()?);
                }
            }
            Event::CData(data) => {
                if let Some((_, buf, _)) = field.as_mut() {
                    buf.push_str(&reader.decoder().decode(&data)?);
                }
            }
            Event::GeneralRef(reference) => {
                if let Some((_, buf, _)) = field.as_mut() {
                    if let Some(ch) = reference.resolve_char_ref()? {
                        buf.push(ch);
                    } else if let Some(text) =
                        resolve_predefined_entity(&reference.xml_content()?)
                    {
                        buf.push_str(text);
                    }
                }
            }
            Event::End(end) => match field.take() {
                Some((name, text, depth)) => {
                    if depth > 0 {
                        field = Some((name, text, depth - 1));
                    } else if let Some(item) = current.as_mut() {
                        item.fields.push((name, text.trim().to_string()));
                    }
                }
                None => {
                    if current.is_some() && end.local_name().as_ref() == item_tag {
                        items.push(current.take().unwrap_or_default());
                    }
                }
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(items)
}

fn collect_hrefs(start: &BytesStart, item: &mut RawItem) -> Result<(), Box<dyn Error>> {
    for attr in start.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == b"href" {
            item.link_hrefs.push(attr.unescape_value()?.into_owned());
        }
    }
    Ok(())
}

fn entry_from_item(item: &RawItem, source: &Source, fetched_at: DateTime<Utc>) -> NewsEntry {
    let published_at = TIMESTAMP_TAGS
        .iter()
        .filter_map(|tag| item.text(tag))
        .find_map(parse_timestamp)
        .unwrap_or(fetched_at);
    let published_local = published_at.with_timezone(&*TARGET_TZ);

    NewsEntry {
        source_id: source.id.to_string(),
        source: source.name.to_string(),
        title: item.text("title").unwrap_or(UNTITLED_PLACEHOLDER).to_string(),
        summary: item.first_text(&SUMMARY_TAGS).unwrap_or_default().to_string(),
        published_at,
        published_local,
        date: published_local.date_naive(),
        url: item.link(),
    }
}

/// Parse a feed timestamp: RFC 2822 first, then RFC 3339/ISO-8601 (a
/// trailing `Z` is the UTC offset). Values with no timezone at all,
/// including date-only strings, are assumed UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let value = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    let naive_formats = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        // RFC 2822 with the timezone omitted
        "%a, %d %b %Y %H:%M:%S",
        "%d %b %Y %H:%M:%S",
    ];
    for format in naive_formats {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| Utc.from_utc_datetime(&naive));
    }
    None
}
