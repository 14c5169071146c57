//! Test configuration helpers

use newsgate::Config;
use newsgate::config::{ApiConfig, ModerationConfig, UpstreamConfig};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::MockServer;

/// Mock article, comments and censorship services plus a feed host
pub struct MockPlatform {
    /// Article service
    pub news: MockServer,
    /// Comments service
    pub comments: MockServer,
    /// Censorship service
    pub censorship: MockServer,
    /// Serves feed documents
    pub feeds: MockServer,
}

impl MockPlatform {
    /// Start all mock servers
    pub async fn start() -> Self {
        Self {
            news: MockServer::start().await,
            comments: MockServer::start().await,
            censorship: MockServer::start().await,
            feeds: MockServer::start().await,
        }
    }

    /// Absolute URL of a feed path on the feed host
    pub fn feed_url(&self, path: &str) -> String {
        format!("{}{}", self.feeds.uri(), path)
    }

    /// Configuration wired to the mocks, a temp database and an ephemeral port
    ///
    /// `request_period` 0 means the feeds are polled exactly once.
    pub fn config(&self, temp_dir: &TempDir, feeds: &[&str], request_period: i64) -> Config {
        Config {
            rss: feeds.iter().map(|p| self.feed_url(p)).collect(),
            request_period,
            feed_timeout: Duration::from_secs(5),
            database_path: temp_dir.path().join("newsgate.db"),
            upstream: UpstreamConfig {
                news_url: self.news.uri(),
                comments_url: self.comments.uri(),
                censorship_url: self.censorship.uri(),
                timeout: Duration::from_secs(2),
            },
            api: ApiConfig {
                bind_address: "127.0.0.1:0".parse().unwrap(),
                cors_enabled: true,
                cors_origins: vec!["*".to_string()],
            },
            moderation: ModerationConfig {
                interval: Duration::from_millis(100),
                banned_words: vec!["qwerty".into(), "йцукен".into(), "zxcvbnm".into()],
            },
        }
    }
}
