//! Live tests against real public feeds
//!
//! Feature-gated behind `live-tests` and marked `#[ignore]` so they never run in CI.
//!
//! ```bash
//! cargo test --features live-tests --test live_feeds -- --ignored --nocapture
//! ```
//!
//! Set `LIVE_FEED_URL` to override the feed under test.

#![cfg(feature = "live-tests")]

use newsgate::feeds::{FeedFetcher, parse_feed};
use std::time::Duration;

const DEFAULT_FEED: &str = "https://blog.rust-lang.org/feed.xml";

#[tokio::test]
#[ignore]
async fn test_fetch_and_parse_live_feed() {
    let url = std::env::var("LIVE_FEED_URL").unwrap_or_else(|_| DEFAULT_FEED.to_string());

    let fetcher = FeedFetcher::new(Duration::from_secs(10)).unwrap();
    let content = fetcher.fetch(&url).await.unwrap();
    let records = parse_feed(&url, &content).unwrap();

    println!("{} records from {}", records.len(), url);
    assert!(!records.is_empty(), "live feed should have at least one item");
    for record in &records {
        assert!(!record.link.is_empty(), "every record needs a link");
    }
}
