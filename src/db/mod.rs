//! Database layer for newsgate
//!
//! Handles SQLite persistence for ingested posts and moderated comments.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`] — Database lifecycle, schema migrations
//! - [`posts`] — Posts written by the feed ingestion consumer
//! - [`comments`] — Comments and their moderation visibility
//!
//! [`Database`] also implements the [`PostStore`](crate::storage::PostStore) and
//! [`CommentStore`](crate::storage::CommentStore) traits used by the background jobs.

use crate::error::DatabaseError;
use crate::types::{Comment, Post, Visibility};
use crate::{Error, Result};
use sqlx::{FromRow, sqlite::SqlitePool};

mod comments;
mod migrations;
mod posts;

/// Post record from database
#[derive(Debug, Clone, FromRow)]
pub struct PostRow {
    /// Unique database ID
    pub id: i64,
    /// Item title
    pub title: String,
    /// Normalized body
    pub content: String,
    /// Unix timestamp of publication
    pub pub_time: i64,
    /// Canonical link (unique)
    pub link: String,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: row.id,
            title: row.title,
            content: row.content,
            pub_time: row.pub_time,
            link: row.link,
        }
    }
}

/// Comment record from database (raw from SQLite)
#[derive(Debug, Clone, FromRow)]
pub struct CommentRow {
    /// Unique database ID
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
    /// Visibility as stored text ("pending", "allowed", "blocked")
    pub visibility: String,
}

impl TryFrom<CommentRow> for Comment {
    type Error = Error;

    fn try_from(row: CommentRow) -> Result<Self> {
        let visibility = row.visibility.parse::<Visibility>().map_err(|e| {
            Error::Database(DatabaseError::DecodeFailed(format!(
                "comment {}: {}",
                row.id, e
            )))
        })?;

        Ok(Comment {
            id: row.id,
            news_id: row.news_id,
            parent_id: row.parent_id,
            author: row.author,
            content: row.content,
            created_at: row.created_at,
            visibility,
        })
    }
}

/// Database handle for newsgate
pub struct Database {
    pool: SqlitePool,
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
