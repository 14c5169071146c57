use crate::db::*;
use crate::error::{DatabaseError, Error};
use crate::storage::CommentStore;
use crate::types::{NewComment, Visibility};
use tempfile::NamedTempFile;

fn comment(news_id: &str, content: &str) -> NewComment {
    NewComment {
        news_id: news_id.to_string(),
        parent_id: None,
        author: "Alice".to_string(),
        content: content.to_string(),
    }
}

#[tokio::test]
async fn test_new_comment_starts_pending() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    let id = db.insert_comment(&comment("7", "First!")).await.unwrap();
    let stored = db.get_comment(id).await.unwrap().unwrap();

    assert_eq!(stored.visibility, Visibility::Pending);
    assert_eq!(stored.news_id, "7");
    assert_eq!(stored.content, "First!");
    assert!(stored.created_at > 0);
}

#[tokio::test]
async fn test_pending_comments_excludes_decided_ones() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    let a = db.insert_comment(&comment("1", "a")).await.unwrap();
    let b = db.insert_comment(&comment("1", "b")).await.unwrap();
    db.set_visibility(a, Visibility::Allowed).await.unwrap();

    let pending: Vec<i64> = db
        .pending_comments()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.unwrap().id)
        .collect();
    assert_eq!(pending, vec![b]);
}

#[tokio::test]
async fn test_set_visibility_on_missing_comment() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    let err = db.set_visibility(42, Visibility::Blocked).await.unwrap_err();
    assert!(matches!(err, Error::Database(DatabaseError::NotFound(_))));
}

#[tokio::test]
async fn test_comments_for_article_filters_by_visibility() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    let a = db.insert_comment(&comment("9", "ok")).await.unwrap();
    let b = db.insert_comment(&comment("9", "spam")).await.unwrap();
    db.insert_comment(&comment("10", "elsewhere")).await.unwrap();
    db.set_visibility(a, Visibility::Allowed).await.unwrap();
    db.set_visibility(b, Visibility::Blocked).await.unwrap();

    let all = db.comments_for_article("9", None).await.unwrap();
    assert_eq!(all.len(), 2);

    let visible = db
        .comments_for_article("9", Some(Visibility::Allowed))
        .await
        .unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].id, a);
}

#[tokio::test]
async fn test_unknown_visibility_fails_only_that_row() {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();

    let good = db.insert_comment(&comment("1", "fine")).await.unwrap();
    let bad = db.insert_comment(&comment("1", "odd")).await.unwrap();
    sqlx::query("UPDATE comments SET visibility = 'hidden' WHERE id = ?")
        .bind(bad)
        .execute(db.pool())
        .await
        .unwrap();

    let err = db.get_comment(bad).await.unwrap_err();
    assert!(matches!(err, Error::Database(DatabaseError::DecodeFailed(_))));

    // 'hidden' rows are not pending, so the sweep query still only sees the good one
    let pending = db.pending_comments().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].as_ref().unwrap().id, good);
}
