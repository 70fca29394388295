use std::cmp::Ordering;
use std::env;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::http::get_text_with_retries;

pub(crate) const FEED_URL_ENV: &str = "NOTICAST_FEED_URL";
pub(crate) const FEED_KEY_ENV: &str = "NOTICAST_FEED_KEY";

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NewsItem {
    pub(crate) id: i64,
    pub(crate) title: String,
    pub(crate) summary: String,
    pub(crate) cover: Option<String>,
    pub(crate) audio: Option<String>,
    pub(crate) source: Option<String>,
    pub(crate) publisher: Option<String>,
    pub(crate) published_at: Option<String>,
}

impl NewsItem {
    /// The cover doubles as a video when it points at a watchable URL.
    pub(crate) fn video_url(&self) -> Option<&str> {
        self.cover.as_deref().filter(|url| is_youtube_url(url))
    }

    pub(crate) fn has_audio(&self) -> bool {
        self.audio.is_some()
    }

    pub(crate) fn has_video(&self) -> bool {
        self.video_url().is_some()
    }
}

#[derive(Debug, Default)]
pub(crate) struct FeedRead {
    pub(crate) items: Vec<NewsItem>,
    pub(crate) warnings: Vec<String>,
}

/// Fetch the configured feed. Every failure mode degrades to an empty list
/// with a warning; callers decide where the warning surfaces.
pub(crate) fn fetch_all_news() -> FeedRead {
    let Some(url) = feed_url() else {
        return FeedRead {
            items: Vec::new(),
            warnings: vec![format!("{FEED_URL_ENV} is not set; showing an empty list")],
        };
    };

    let headers = feed_headers();
    match get_text_with_retries(
        &url,
        &headers,
        Duration::from_secs(3),
        Duration::from_secs(8),
        3,
        Duration::from_millis(500),
    ) {
        Ok(body) => parse_feed(&body),
        Err(err) => FeedRead {
            items: Vec::new(),
            warnings: vec![format!("feed fetch failed: {err}")],
        },
    }
}

fn feed_url() -> Option<String> {
    env::var(FEED_URL_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
}

fn feed_headers() -> Vec<(String, String)> {
    match env::var(FEED_KEY_ENV) {
        Ok(key) if !key.trim().is_empty() => vec![
            ("apikey".to_string(), key.clone()),
            ("Authorization".to_string(), format!("Bearer {key}")),
        ],
        _ => Vec::new(),
    }
}

pub(crate) fn parse_feed(raw: &str) -> FeedRead {
    let parsed: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(err) => {
            return FeedRead {
                items: Vec::new(),
                warnings: vec![format!("feed response is not valid JSON: {err}")],
            };
        }
    };
    let Some(rows) = parsed.as_array() else {
        return FeedRead {
            items: Vec::new(),
            warnings: vec!["feed response is not a JSON array".to_string()],
        };
    };

    let mut items = Vec::new();
    let mut skipped_rows = 0_usize;
    for row in rows {
        match parse_news_row(row) {
            Some(item) => items.push(item),
            None => skipped_rows += 1,
        }
    }
    sort_by_published_desc(&mut items);

    let mut warnings = Vec::new();
    if skipped_rows > 0 {
        warnings.push(format!("ignored {skipped_rows} malformed feed row(s)"));
    }
    FeedRead { items, warnings }
}

fn parse_news_row(row: &Value) -> Option<NewsItem> {
    let id = parse_row_id(row.get("id")?)?;
    let title = non_empty_string(row.get("title"))?;
    Some(NewsItem {
        id,
        title,
        summary: non_empty_string(row.get("summary")).unwrap_or_default(),
        cover: non_empty_string(row.get("cover")),
        audio: non_empty_string(row.get("audio")),
        source: non_empty_string(row.get("source")),
        publisher: non_empty_string(row.get("publisher")),
        published_at: non_empty_string(row.get("published_at")),
    })
}

fn parse_row_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn non_empty_string(value: Option<&Value>) -> Option<String> {
    let text = value?.as_str()?.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

pub(crate) fn sort_by_published_desc(items: &mut [NewsItem]) {
    items.sort_by(|left, right| {
        compare_published_desc(left.published_at.as_deref(), right.published_at.as_deref())
    });
}

pub(crate) fn compare_published_desc(left: Option<&str>, right: Option<&str>) -> Ordering {
    match (parse_published(left), parse_published(right)) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => right.unwrap_or("").cmp(left.unwrap_or("")),
    }
}

pub(crate) fn parse_published(raw: Option<&str>) -> Option<NaiveDateTime> {
    let raw = raw?.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.naive_utc());
    }
    for format in ["%Y-%m-%d", "%d/%m/%Y"] {
        if let Ok(parsed) = NaiveDate::parse_from_str(raw, format) {
            return parsed.and_hms_opt(0, 0, 0);
        }
    }
    None
}

pub(crate) fn format_published_display(raw: &str) -> String {
    match parse_published(Some(raw)) {
        Some(parsed) => parsed.format("%Y-%m-%d").to_string(),
        None => raw.to_string(),
    }
}

pub(crate) fn is_youtube_url(url: &str) -> bool {
    extract_youtube_id(url).is_some()
}

pub(crate) fn extract_youtube_id(url: &str) -> Option<String> {
    let trimmed = url.trim();
    let rest = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    let rest = rest.strip_prefix("www.").or_else(|| rest.strip_prefix("m.")).unwrap_or(rest);

    let candidate = if let Some(path) = rest.strip_prefix("youtu.be/") {
        path.split(['?', '&', '#']).next()
    } else if let Some(path) = rest.strip_prefix("youtube.com/") {
        if let Some(query) = path.strip_prefix("watch?") {
            query
                .split('&')
                .find_map(|pair| pair.strip_prefix("v="))
                .map(|value| value.split('#').next().unwrap_or(value))
        } else if let Some(path) = path
            .strip_prefix("embed/")
            .or_else(|| path.strip_prefix("shorts/"))
        {
            path.split(['?', '#']).next()
        } else {
            None
        }
    } else {
        None
    };

    let id = candidate?.trim();
    if is_plausible_video_id(id) {
        Some(id.to_string())
    } else {
        None
    }
}

fn is_plausible_video_id(id: &str) -> bool {
    id.len() == 11
        && id
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
}

pub(crate) fn format_clock(position: Duration) -> String {
    let total = position.as_secs();
    format!("{}:{:02}", total / 60, total % 60)
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    let mut out = s.to_string();
    if out.chars().count() > max {
        out = out.chars().take(max.saturating_sub(3)).collect::<String>() + "...";
    }
    out
}
