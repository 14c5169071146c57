//! Configuration types for newsgate

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::{net::SocketAddr, path::Path, path::PathBuf, time::Duration};
use utoipa::ToSchema;

/// Upstream service locations and the fixed per-call deadline used by the gateway
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct UpstreamConfig {
    /// Base URL of the article service (e.g., "http://news:8080")
    #[serde(default = "default_news_url")]
    pub news_url: String,

    /// Base URL of the comments service
    #[serde(default = "default_comments_url")]
    pub comments_url: String,

    /// Base URL of the censorship service
    #[serde(default = "default_censorship_url")]
    pub censorship_url: String,

    /// Deadline for every upstream call in seconds (default: 5)
    #[serde(default = "default_upstream_timeout", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub timeout: Duration,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            news_url: default_news_url(),
            comments_url: default_comments_url(),
            censorship_url: default_censorship_url(),
            timeout: default_upstream_timeout(),
        }
    }
}

/// HTTP server configuration for the gateway
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind the gateway to (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_address")]
    #[schema(value_type = String)]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins, "*" allows any (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
        }
    }
}

/// Moderation sweep configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ModerationConfig {
    /// Time between sweeps in seconds (default: 5)
    #[serde(default = "default_moderation_interval", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub interval: Duration,

    /// Case-insensitive banned substrings
    #[serde(default = "default_banned_words")]
    pub banned_words: Vec<String>,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            interval: default_moderation_interval(),
            banned_words: default_banned_words(),
        }
    }
}

/// Main configuration document
///
/// The feed list and polling period use the field names of the platform's
/// `config.json` (`rss`, `request_period`). Everything else is optional.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Feed URLs polled by the ingestion pipeline, in polling order
    #[serde(default)]
    pub rss: Vec<String>,

    /// Polling period in minutes (default: 5, non-positive = poll once)
    #[serde(default = "default_request_period")]
    pub request_period: i64,

    /// Deadline for a single feed fetch in seconds (default: 10)
    #[serde(default = "default_feed_timeout", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub feed_timeout: Duration,

    /// SQLite database path (default: "./newsgate.db")
    #[serde(default = "default_database_path")]
    #[schema(value_type = String)]
    pub database_path: PathBuf,

    /// Upstream services called by the gateway
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Gateway HTTP server
    #[serde(default)]
    pub api: ApiConfig,

    /// Moderation sweep
    #[serde(default)]
    pub moderation: ModerationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rss: Vec::new(),
            request_period: default_request_period(),
            feed_timeout: default_feed_timeout(),
            database_path: default_database_path(),
            upstream: UpstreamConfig::default(),
            api: ApiConfig::default(),
            moderation: ModerationConfig::default(),
        }
    }
}

impl Config {
    /// Load and normalize a JSON configuration file
    ///
    /// # Errors
    /// Returns `Error::Config` if the file cannot be read, is not valid JSON,
    /// or lists no feeds after normalization.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read {}: {}", path.display(), e),
            key: None,
        })?;

        Self::from_json(&raw)
    }

    /// Parse and normalize a JSON configuration document
    pub fn from_json(raw: &str) -> Result<Self> {
        let mut config: Config = serde_json::from_str(raw).map_err(|e| Error::Config {
            message: format!("deserialization error: {}", e),
            key: None,
        })?;

        config.normalize()?;
        Ok(config)
    }

    /// Trim and de-duplicate the feed list, keeping first occurrences in order
    ///
    /// # Errors
    /// Returns `Error::Config` for an empty feed list or a `request_period` above
    /// [`MAX_REQUEST_PERIOD`] minutes.
    pub fn normalize(&mut self) -> Result<()> {
        self.rss = dedup_feeds(&self.rss);

        if self.request_period > MAX_REQUEST_PERIOD {
            return Err(Error::Config {
                message: format!(
                    "request_period {} exceeds {} minutes",
                    self.request_period, MAX_REQUEST_PERIOD
                ),
                key: Some("request_period".to_string()),
            });
        }

        if self.rss.is_empty() {
            return Err(Error::Config {
                message: "rss list is empty".to_string(),
                key: Some("rss".to_string()),
            });
        }

        Ok(())
    }

    /// Polling period as a duration, `None` when the pipeline should run once
    ///
    /// Periods above [`MAX_REQUEST_PERIOD`] are clamped to it.
    pub fn poll_period(&self) -> Option<Duration> {
        let minutes = u64::try_from(self.request_period.min(MAX_REQUEST_PERIOD)).ok()?;
        if minutes == 0 {
            return None;
        }
        Some(Duration::from_secs(minutes * 60))
    }
}

/// Longest accepted polling period in minutes (one year)
pub const MAX_REQUEST_PERIOD: i64 = 525_600;

/// Trim whitespace, drop blanks and remove duplicate feed URLs (order-stable)
pub fn dedup_feeds(feeds: &[String]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(feeds.len());
    feeds
        .iter()
        .map(|raw| raw.trim())
        .filter(|url| !url.is_empty())
        .filter(|url| seen.insert(url.to_string()))
        .map(str::to_string)
        .collect()
}

fn default_true() -> bool {
    true
}

fn default_request_period() -> i64 {
    5
}

fn default_feed_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./newsgate.db")
}

fn default_news_url() -> String {
    "http://localhost:8081".to_string()
}

fn default_comments_url() -> String {
    "http://localhost:8083".to_string()
}

fn default_censorship_url() -> String {
    "http://localhost:8082".to_string()
}

fn default_upstream_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_moderation_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_banned_words() -> Vec<String> {
    vec![
        "qwerty".to_string(),
        "йцукен".to_string(),
        "zxcvbnm".to_string(),
    ]
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_feeds_trims_and_keeps_first_occurrence() {
        let feeds = vec![
            "http://a".to_string(),
            "http://a".to_string(),
            " http://b ".to_string(),
        ];

        assert_eq!(dedup_feeds(&feeds), vec!["http://a", "http://b"]);
    }

    #[test]
    fn test_dedup_feeds_drops_blank_entries() {
        let feeds = vec!["  ".to_string(), "http://c".to_string(), "".to_string()];
        assert_eq!(dedup_feeds(&feeds), vec!["http://c"]);
    }

    #[test]
    fn test_load_valid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "rss": [
                    "https://habr.com/ru/rss/hub/go/all/?fl=ru",
                    "https://habr.com/ru/rss/best/daily/?fl=ru",
                    "https://cprss.s3.amazonaws.com/golangweekly.com.xml"
                ],
                "request_period": 5
            }"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.rss.len(), 3);
        assert_eq!(config.poll_period(), Some(Duration::from_secs(300)));
        assert_eq!(config.upstream.timeout, Duration::from_secs(5));
        assert_eq!(config.moderation.banned_words.len(), 3);
    }

    #[test]
    fn test_load_empty_feed_list_fails() {
        let err = Config::from_json(r#"{"rss": [], "request_period": 0}"#).unwrap_err();
        match err {
            Error::Config { key, .. } => assert_eq!(key.as_deref(), Some("rss")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(dir.path().join("missing.json"));
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_load_invalid_json_fails() {
        assert!(matches!(
            Config::from_json("{not json"),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn test_request_period_defaults_and_run_once() {
        let config = Config::from_json(r#"{"rss": ["http://a"]}"#).unwrap();
        assert_eq!(config.request_period, 5);

        let config = Config::from_json(r#"{"rss": ["http://a"], "request_period": -1}"#).unwrap();
        assert_eq!(config.poll_period(), None);

        let config = Config::from_json(r#"{"rss": ["http://a"], "request_period": 0}"#).unwrap();
        assert_eq!(config.poll_period(), None);
    }

    #[test]
    fn test_oversized_request_period_is_rejected() {
        let err = Config::from_json(r#"{"rss": ["http://a"], "request_period": 9223372036854775807}"#)
            .unwrap_err();
        match err {
            Error::Config { key, .. } => assert_eq!(key.as_deref(), Some("request_period")),
            other => panic!("unexpected error: {other:?}"),
        }

        let config = Config::from_json(r#"{"rss": ["http://a"], "request_period": 525600}"#).unwrap();
        assert_eq!(config.poll_period(), Some(Duration::from_secs(525_600 * 60)));
    }

    #[test]
    fn test_poll_period_clamps_without_overflow() {
        let config = Config {
            rss: vec!["http://a".to_string()],
            request_period: i64::MAX,
            ..Config::default()
        };
        assert_eq!(
            config.poll_period(),
            Some(Duration::from_secs(MAX_REQUEST_PERIOD as u64 * 60))
        );
    }

    #[test]
    fn test_nested_sections_deserialize() {
        let config = Config::from_json(
            r#"{
                "rss": ["http://a"],
                "upstream": {"news_url": "http://news", "timeout": 2},
                "moderation": {"interval": 30, "banned_words": ["spam"]}
            }"#,
        )
        .unwrap();

        assert_eq!(config.upstream.news_url, "http://news");
        assert_eq!(config.upstream.comments_url, default_comments_url());
        assert_eq!(config.upstream.timeout, Duration::from_secs(2));
        assert_eq!(config.moderation.interval, Duration::from_secs(30));
        assert_eq!(config.moderation.banned_words, vec!["spam"]);
    }
}
