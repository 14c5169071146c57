//! Feed parsing and normalization
//!
//! Content is parsed as RSS 2.0 first and as Atom if that fails. Every item becomes a
//! [`FeedRecord`] with HTML stripped from the body and a best-effort publish time.

use crate::error::{Error, Result};
use crate::types::FeedRecord;
use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"(?s)<[^>]*>").expect("tag pattern is valid")
});

static SPACE_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"\s+").expect("whitespace pattern is valid")
});

/// Layouts carrying a numeric UTC offset
const OFFSET_LAYOUTS: &[&str] = &[
    "%m/%d %I:%M:%S%p '%y %z",   // 01/02 03:04:05PM '06 -0700
    "%a %b %d %H:%M:%S %z %Y",   // Mon Jan 02 15:04:05 -0700 2006
    "%d %b %y %H:%M %z",         // 02 Jan 06 15:04 -0700
    "%a, %d %b %Y %H:%M:%S %z",  // Mon, 02 Jan 2006 15:04:05 -0700
];

/// Layouts without an offset (zone names are skipped and read as UTC)
const NAIVE_LAYOUTS: &[&str] = &[
    "%a %b %e %H:%M:%S %Y",      // Mon Jan  2 15:04:05 2006
    "%a %b %e %H:%M:%S %Z %Y",   // Mon Jan  2 15:04:05 MST 2006
    "%d %b %y %H:%M %Z",         // 02 Jan 06 15:04 MST
    "%A, %d-%b-%y %H:%M:%S %Z",  // Monday, 02-Jan-06 15:04:05 MST
    "%a, %d %b %Y %H:%M:%S %Z",  // Mon, 02 Jan 2006 15:04:05 MST
];

/// Parse feed content from `url` into normalized records
///
/// # Errors
/// Returns `Error::FeedParse` if the content is neither RSS nor Atom
pub fn parse_feed(url: &str, content: &str) -> Result<Vec<FeedRecord>> {
    match parse_as_rss(content) {
        Ok(records) => {
            debug!(url, count = records.len(), "parsed feed as RSS");
            Ok(records)
        }
        Err(rss_err) => match parse_as_atom(content) {
            Ok(records) => {
                debug!(url, count = records.len(), "parsed feed as Atom");
                Ok(records)
            }
            Err(atom_err) => Err(Error::FeedParse {
                url: url.to_string(),
                reason: format!("RSS error: {}. Atom error: {}", rss_err, atom_err),
            }),
        },
    }
}

fn parse_as_rss(content: &str) -> std::result::Result<Vec<FeedRecord>, String> {
    let channel = content
        .parse::<rss::Channel>()
        .map_err(|e| e.to_string())?;

    Ok(channel
        .items()
        .iter()
        .map(|item| FeedRecord {
            title: item.title().unwrap_or_default().trim().to_string(),
            content: strip_tags(item.description().unwrap_or_default()),
            pub_time: parse_pub_date(item.pub_date().unwrap_or_default()),
            link: item
                .link()
                .or_else(|| item.guid().filter(|g| g.is_permalink()).map(|g| g.value()))
                .unwrap_or_default()
                .trim()
                .to_string(),
        })
        .collect())
}

fn parse_as_atom(content: &str) -> std::result::Result<Vec<FeedRecord>, String> {
    let feed = atom_syndication::Feed::read_from(content.as_bytes()).map_err(|e| e.to_string())?;

    Ok(feed
        .entries()
        .iter()
        .map(|entry| {
            let body = entry
                .summary()
                .map(|s| s.as_str().to_string())
                .or_else(|| entry.content().and_then(|c| c.value().map(str::to_string)))
                .unwrap_or_default();

            let link = entry
                .links()
                .iter()
                .find(|l| l.rel() == "alternate")
                .or_else(|| entry.links().first())
                .map(|l| l.href().to_string())
                .unwrap_or_default();

            let pub_time = entry
                .published()
                .unwrap_or_else(|| entry.updated())
                .with_timezone(&Utc);

            FeedRecord {
                title: entry.title().as_str().trim().to_string(),
                content: strip_tags(&body),
                pub_time,
                link,
            }
        })
        .collect())
}

/// Remove HTML tags, decode the common entities and collapse whitespace
pub fn strip_tags(html: &str) -> String {
    let text = TAG_RE.replace_all(html, " ");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");
    SPACE_RE.replace_all(&text, " ").trim().to_string()
}

/// Best-effort publish date; the Unix epoch when nothing matches
pub fn parse_pub_date(raw: &str) -> DateTime<Utc> {
    let raw = raw.trim();
    if raw.is_empty() {
        return DateTime::<Utc>::default();
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Utc);
    }
    for layout in OFFSET_LAYOUTS {
        if let Ok(dt) = DateTime::parse_from_str(raw, layout) {
            return dt.with_timezone(&Utc);
        }
    }
    for layout in NAIVE_LAYOUTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, layout) {
            return dt.and_utc();
        }
    }

    warn!(pub_date = raw, "pubDate parse failed");
    DateTime::<Utc>::default()
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
    <channel>
        <title>Go Weekly</title>
        <link>https://example.com</link>
        <description>Test RSS Feed</description>
        <item>
            <title>Go 1.23 released</title>
            <link>https://example.com/go-1-23</link>
            <pubDate>Mon, 01 Jan 2024 12:00:00 +0000</pubDate>
            <description><![CDATA[<p>The <b>new</b> release&nbsp;is out</p>]]></description>
        </item>
        <item>
            <title>Undated item</title>
            <guid isPermaLink="true">https://example.com/undated</guid>
            <pubDate>sometime last week</pubDate>
            <description>plain text</description>
        </item>
    </channel>
</rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
    <title>Test Atom Feed</title>
    <id>https://example.com/atom</id>
    <updated>2024-01-01T12:00:00Z</updated>
    <entry>
        <title>Atom entry</title>
        <id>entry-1</id>
        <updated>2024-01-02T14:30:00Z</updated>
        <published>2024-01-01T10:00:00Z</published>
        <summary>A &lt;i&gt;short&lt;/i&gt; summary</summary>
        <link href="https://example.com/atom/1" rel="alternate"/>
    </entry>
</feed>"#;

    #[test]
    fn test_parse_rss_items() {
        let records = parse_feed("http://feed", RSS).unwrap();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].title, "Go 1.23 released");
        assert_eq!(records[0].content, "The new release is out");
        assert_eq!(records[0].link, "https://example.com/go-1-23");
        assert_eq!(records[0].pub_time.year(), 2024);
        assert_eq!(records[0].pub_time.hour(), 12);

        assert_eq!(records[1].link, "https://example.com/undated");
        assert_eq!(records[1].pub_time, DateTime::<Utc>::default());
    }

    #[test]
    fn test_parse_atom_entries() {
        let records = parse_feed("http://feed", ATOM).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Atom entry");
        assert_eq!(records[0].content, "A short summary");
        assert_eq!(records[0].link, "https://example.com/atom/1");
        assert_eq!(records[0].pub_time.day(), 1);
        assert_eq!(records[0].pub_time.hour(), 10);
    }

    #[test]
    fn test_parse_invalid_content() {
        let result = parse_feed("http://feed", "This is not XML at all!");
        match result {
            Err(Error::FeedParse { url, .. }) => assert_eq!(url, "http://feed"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_strip_tags() {
        assert_eq!(strip_tags("<div>\n  Hello <a href=\"x\">world</a>\n</div>"), "Hello world");
        assert_eq!(strip_tags("Tom &amp; Jerry"), "Tom & Jerry");
        assert_eq!(strip_tags(""), "");
    }

    #[test]
    fn test_parse_pub_date_layouts() {
        let cases = [
            "Mon, 02 Jan 2006 15:04:05 -0700",
            "Mon, 02 Jan 2006 15:04:05 GMT",
            "2006-01-02T15:04:05Z",
            "Mon Jan  2 15:04:05 2006",
            "Mon Jan  2 15:04:05 MST 2006",
            "Mon Jan 02 15:04:05 -0700 2006",
            "02 Jan 06 15:04 MST",
            "02 Jan 06 15:04 -0700",
            "Monday, 02-Jan-06 15:04:05 MST",
        ];
        for raw in cases {
            let parsed = parse_pub_date(raw);
            assert_eq!(parsed.year(), 2006, "layout {raw}");
            assert_eq!(parsed.month(), 1, "layout {raw}");
        }
    }

    #[test]
    fn test_parse_pub_date_failure_is_epoch() {
        assert_eq!(parse_pub_date("not a date"), DateTime::<Utc>::default());
        assert_eq!(parse_pub_date(""), DateTime::<Utc>::default());
    }
}
