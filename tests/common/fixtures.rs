//! Feed documents and polling helpers

use std::future::Future;
use std::time::Duration;

/// Build an RSS 2.0 document with one item per `(title, link)` pair
pub fn rss_feed(items: &[(&str, &str)]) -> String {
    let items: String = items
        .iter()
        .map(|(title, link)| {
            format!(
                "<item><title>{title}</title><link>{link}</link>\
                 <pubDate>Mon, 01 Jan 2024 12:00:00 +0000</pubDate>\
                 <description><![CDATA[<p>{title} body</p>]]></description></item>"
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>Test</title><link>http://example.com</link><description>Test feed</description>{items}</channel></rss>"#
    )
}

/// Build an Atom document with one entry per `(title, link)` pair
pub fn atom_feed(items: &[(&str, &str)]) -> String {
    let entries: String = items
        .iter()
        .enumerate()
        .map(|(i, (title, link))| {
            format!(
                r#"<entry><title>{title}</title><id>urn:entry:{i}</id><updated>2024-01-02T10:00:00Z</updated><summary>{title} summary</summary><link href="{link}" rel="alternate"/></entry>"#
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom"><title>Atom</title><id>urn:feed</id><updated>2024-01-02T10:00:00Z</updated>{entries}</feed>"#
    )
}

/// Result of waiting for a condition
#[derive(Debug, PartialEq, Eq)]
pub enum WaitResult {
    /// Condition became true
    Ready,
    /// Deadline passed first
    Timeout,
}

/// Poll `check` every 50ms until it returns true or `timeout` passes
pub async fn wait_until<F, Fut>(timeout: Duration, mut check: F) -> WaitResult
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;

    loop {
        if check().await {
            return WaitResult::Ready;
        }
        if tokio::time::Instant::now() >= deadline {
            return WaitResult::Timeout;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}
