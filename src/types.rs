//! Core types shared by the gateway, the ingestion pipeline and the moderation sweep

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Article summary as returned by the article service's `GET /news/new/{id}`
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct ArticleSummary {
    /// Article id
    #[serde(alias = "ID")]
    pub id: i64,
    /// Headline
    #[serde(alias = "Title")]
    pub title: String,
    /// Canonical link to the original article
    #[serde(alias = "Link")]
    pub link: String,
}

/// Comment as returned by the comments service's `GET /comments/{articleId}`
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct CommentView {
    /// Comment id
    #[serde(alias = "ID")]
    pub id: String,
    /// Article the comment belongs to
    #[serde(alias = "NewsID")]
    pub news_id: String,
    /// Parent comment for replies
    #[serde(alias = "ParentID", skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Author name
    #[serde(alias = "Author")]
    pub author: String,
    /// Comment text
    #[serde(alias = "Content")]
    pub content: String,
    /// Unix timestamp of creation
    #[serde(alias = "CreatedAt")]
    pub created_at: i64,
}

/// Composite answer of `GET /news/{id}`: the article plus its comments
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DetailedArticle {
    /// Article summary from the article service
    pub news: ArticleSummary,
    /// Comments from the comments service
    pub comments: Vec<CommentView>,
}

/// One normalized item parsed from a feed, not yet persisted
#[derive(Clone, Debug, PartialEq)]
pub struct FeedRecord {
    /// Item title
    pub title: String,
    /// Description with HTML tags stripped
    pub content: String,
    /// Publication time, Unix epoch when the feed date could not be parsed
    pub pub_time: DateTime<Utc>,
    /// Canonical link
    pub link: String,
}

/// All records parsed from one feed in one poll cycle
#[derive(Clone, Debug)]
pub struct FeedBatch {
    /// Feed URL the records came from
    pub feed_url: String,
    /// Records in feed order
    pub records: Vec<FeedRecord>,
}

/// Persisted news post
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Post {
    /// Database id
    pub id: i64,
    /// Title
    pub title: String,
    /// Normalized body
    pub content: String,
    /// Publication time as Unix timestamp
    pub pub_time: i64,
    /// Canonical link (unique)
    pub link: String,
}

/// Moderation state of a stored comment
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Waiting for the next moderation sweep
    #[default]
    Pending,
    /// Visible to readers
    Allowed,
    /// Hidden because it contains banned content
    Blocked,
}

impl Visibility {
    /// Visibility for a moderation decision
    pub fn from_allowed(allowed: bool) -> Self {
        if allowed {
            Visibility::Allowed
        } else {
            Visibility::Blocked
        }
    }

    /// Storage representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Pending => "pending",
            Visibility::Allowed => "allowed",
            Visibility::Blocked => "blocked",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Visibility::Pending),
            "allowed" => Ok(Visibility::Allowed),
            "blocked" => Ok(Visibility::Blocked),
            other => Err(format!("unknown visibility: {}", other)),
        }
    }
}

/// Comment to be inserted into storage (always starts pending)
#[derive(Clone, Debug)]
pub struct NewComment {
    /// Article the comment belongs to
    pub news_id: String,
    /// Parent comment for replies
    pub parent_id: Option<String>,
    /// Author name
    pub author: String,
    /// Comment text
    pub content: String,
}

/// Persisted comment
#[derive(Clone, Debug, PartialEq)]
pub struct Comment {
    /// Database id
    pub id: i64,
    /// Article the comment belongs to
    pub news_id: String,
    /// Parent comment for replies
    pub parent_id: Option<String>,
    /// Author name
    pub author: String,
    /// Comment text
    pub content: String,
    /// Unix timestamp of creation
    pub created_at: i64,
    /// Moderation state
    pub visibility: Visibility,
}
