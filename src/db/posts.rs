//! Posts written by the feed ingestion consumer.
//!
//! The consumer only inserts. The read side (`get_post`, `latest_posts`, `count_posts`)
//! serves the application embedding the crate; the gateway itself reads news from the
//! article service.

use crate::error::DatabaseError;
use crate::storage::PostStore;
use crate::types::{FeedRecord, Post};
use crate::{Error, Result};
use async_trait::async_trait;

use super::{Database, PostRow};

/// Map an insert failure, singling out the unique-link constraint
fn insert_error(link: &str, e: sqlx::Error) -> Error {
    let unique = e
        .as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation());

    if unique {
        Error::Database(DatabaseError::ConstraintViolation(format!(
            "post with link {} already exists",
            link
        )))
    } else {
        Error::Database(DatabaseError::QueryFailed(format!(
            "Failed to insert post: {}",
            e
        )))
    }
}

impl Database {
    /// Insert a post built from a feed record
    pub async fn insert_post(&self, record: &FeedRecord) -> Result<Post> {
        let pub_time = record.pub_time.timestamp();

        let result = sqlx::query(
            r#"
            INSERT INTO posts (title, content, pub_time, link)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&record.title)
        .bind(&record.content)
        .bind(pub_time)
        .bind(&record.link)
        .execute(&self.pool)
        .await
        .map_err(|e| insert_error(&record.link, e))?;

        Ok(Post {
            id: result.last_insert_rowid(),
            title: record.title.clone(),
            content: record.content.clone(),
            pub_time,
            link: record.link.clone(),
        })
    }

    /// Get post by ID
    pub async fn get_post(&self, id: i64) -> Result<Option<Post>> {
        let row = sqlx::query_as::<_, PostRow>(
            "SELECT id, title, content, pub_time, link FROM posts WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get post: {}",
                e
            )))
        })?;

        Ok(row.map(Post::from))
    }

    /// Most recent posts first, at most `limit`
    pub async fn latest_posts(&self, limit: i64) -> Result<Vec<Post>> {
        let rows = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT id, title, content, pub_time, link
            FROM posts
            ORDER BY pub_time DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to list posts: {}",
                e
            )))
        })?;

        Ok(rows.into_iter().map(Post::from).collect())
    }

    /// Count stored posts
    pub async fn count_posts(&self) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to count posts: {}",
                    e
                )))
            })
    }
}

#[async_trait]
impl PostStore for Database {
    async fn add_post(&self, record: &FeedRecord) -> Result<Post> {
        self.insert_post(record).await
    }
}
