//! Comments and their moderation visibility.
//!
//! The moderation sweeper only reads pending rows and flips their visibility. Writing
//! and listing comments (`insert_comment`, `get_comment`, `comments_for_article`) is
//! left to the application embedding the crate, which owns the comment intake path.

use crate::error::DatabaseError;
use crate::storage::CommentStore;
use crate::types::{Comment, NewComment, Visibility};
use crate::{Error, Result};
use async_trait::async_trait;
use sqlx::FromRow;

use super::{CommentRow, Database};

impl Database {
    /// Insert a new comment; it starts pending moderation
    pub async fn insert_comment(&self, comment: &NewComment) -> Result<i64> {
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            INSERT INTO comments (news_id, parent_id, author, content, created_at, visibility)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&comment.news_id)
        .bind(&comment.parent_id)
        .bind(&comment.author)
        .bind(&comment.content)
        .bind(now)
        .bind(Visibility::Pending.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to insert comment: {}",
                e
            )))
        })?;

        Ok(result.last_insert_rowid())
    }

    /// Get comment by ID
    pub async fn get_comment(&self, id: i64) -> Result<Option<Comment>> {
        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT id, news_id, parent_id, author, content, created_at, visibility
            FROM comments
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get comment: {}",
                e
            )))
        })?;

        row.map(Comment::try_from).transpose()
    }

    /// Comments of one article in creation order, optionally only those with `visibility`
    pub async fn comments_for_article(
        &self,
        news_id: &str,
        visibility: Option<Visibility>,
    ) -> Result<Vec<Comment>> {
        let rows = sqlx::query_as::<_, CommentRow>(
            r#"
            SELECT id, news_id, parent_id, author, content, created_at, visibility
            FROM comments
            WHERE news_id = ? AND (? IS NULL OR visibility = ?)
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(news_id)
        .bind(visibility.map(|v| v.as_str()))
        .bind(visibility.map(|v| v.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get comments: {}",
                e
            )))
        })?;

        rows.into_iter().map(Comment::try_from).collect()
    }

    /// Pending comments, each decoded independently
    pub async fn pending_comment_rows(&self) -> Result<Vec<Result<Comment>>> {
        let rows = sqlx::query(
            r#"
            SELECT id, news_id, parent_id, author, content, created_at, visibility
            FROM comments
            WHERE visibility = ?
            ORDER BY id ASC
            "#,
        )
        .bind(Visibility::Pending.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to query pending comments: {}",
                e
            )))
        })?;

        Ok(rows
            .iter()
            .map(|row| {
                CommentRow::from_row(row)
                    .map_err(|e| {
                        Error::Database(DatabaseError::DecodeFailed(format!(
                            "pending comment: {}",
                            e
                        )))
                    })
                    .and_then(Comment::try_from)
            })
            .collect())
    }

    /// Point update of a comment's visibility
    pub async fn update_comment_visibility(&self, id: i64, visibility: Visibility) -> Result<()> {
        let result = sqlx::query("UPDATE comments SET visibility = ? WHERE id = ?")
            .bind(visibility.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to update comment visibility: {}",
                    e
                )))
            })?;

        if result.rows_affected() == 0 {
            return Err(Error::Database(DatabaseError::NotFound(format!(
                "comment {}",
                id
            ))));
        }

        Ok(())
    }
}

#[async_trait]
impl CommentStore for Database {
    async fn pending_comments(&self) -> Result<Vec<Result<Comment>>> {
        self.pending_comment_rows().await
    }

    async fn set_visibility(&self, id: i64, visibility: Visibility) -> Result<()> {
        self.update_comment_visibility(id, visibility).await
    }
}
