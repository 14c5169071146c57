//! Storage collaborator traits
//!
//! The ingestion consumer and the moderation sweeper only see these traits. The
//! SQLite [`Database`](crate::db::Database) implements both; tests substitute
//! in-memory fakes. Implementations take no locks across calls: the two background
//! jobs share the store without coordination and the last write wins.

use crate::Result;
use crate::types::{Comment, FeedRecord, Post, Visibility};
use async_trait::async_trait;

/// Sink for ingested feed records
#[async_trait]
pub trait PostStore: Send + Sync {
    /// Persist one record and return the stored post
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be stored, e.g. because a post with
    /// the same link already exists.
    async fn add_post(&self, record: &FeedRecord) -> Result<Post>;
}

/// Comment access needed by the moderation sweep
#[async_trait]
pub trait CommentStore: Send + Sync {
    /// All comments currently pending moderation
    ///
    /// The outer error means the query itself failed. Inner errors are rows that
    /// could not be decoded; the sweep skips those and carries on.
    async fn pending_comments(&self) -> Result<Vec<Result<Comment>>>;

    /// Point update of one comment's visibility
    async fn set_visibility(&self, id: i64, visibility: Visibility) -> Result<()>;
}
