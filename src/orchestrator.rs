//! Gateway orchestration over the article, comments and censorship services
//!
//! Two request shapes are coordinated here:
//!
//! - [`Orchestrator::detailed_article`] fans out to the article and comments services
//!   concurrently and joins on both before merging. The outcome is all-or-nothing.
//! - [`Orchestrator::add_comment`] is a sequential two-hop chain: the censorship service
//!   must approve the comment before it is forwarded to the comments service.
//!
//! Every outbound call carries the inbound request's [`RequestId`]. Individual calls
//! are bounded by the [`UpstreamClient`] deadline only; the shared shutdown token is
//! not consulted here.

use crate::config::UpstreamConfig;
use crate::correlation::RequestId;
use crate::error::{Error, Result};
use crate::types::{ArticleSummary, CommentView, DetailedArticle};
use crate::upstream::{UpstreamClient, UpstreamResponse};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Upstream service labels used in errors and logs
pub const NEWS_SERVICE: &str = "news";
/// Comments service label
pub const COMMENTS_SERVICE: &str = "comments";
/// Censorship service label
pub const CENSORSHIP_SERVICE: &str = "censorship";

/// Page size used when the caller lists news without a page number
const DEFAULT_NEWS_LIMIT: &str = "40";

/// Status the censorship service answers with when it approves a comment
const CENSORSHIP_APPROVED: u16 = 200;

/// Result of one fan-out branch
#[derive(Debug)]
enum Branch {
    Article(ArticleSummary),
    Comments(Vec<CommentView>),
}

/// Coordinates calls to the upstream services for one gateway
#[derive(Clone, Debug)]
pub struct Orchestrator {
    client: UpstreamClient,
    news_url: String,
    comments_url: String,
    censorship_url: String,
}

impl Orchestrator {
    /// Create an orchestrator from the upstream configuration
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        Ok(Self {
            client: UpstreamClient::new(config.timeout)?,
            news_url: config.news_url.clone(),
            comments_url: config.comments_url.clone(),
            censorship_url: config.censorship_url.clone(),
        })
    }

    /// Fetch an article and its comments concurrently and merge them
    ///
    /// Both branches run as separate tasks and report into a channel sized to the
    /// number of branches, so a branch that finishes early never waits on the
    /// receiver. The join barrier waits for both branches (or their deadlines)
    /// before any outcome is inspected. If the returned future is dropped, the
    /// `JoinSet` aborts whatever is still running.
    ///
    /// # Errors
    /// Any failure of either branch fails the whole operation; the caller never
    /// receives a partial composite.
    pub async fn detailed_article(&self, id: &str, request_id: &RequestId) -> Result<DetailedArticle> {
        if id.trim().is_empty() {
            return Err(Error::Validation("invalid id format".to_string()));
        }

        let article_url =
            UpstreamClient::endpoint(&self.news_url, &["news", "new", id], &[], request_id)?;
        let comments_url =
            UpstreamClient::endpoint(&self.comments_url, &["comments", id], &[], request_id)?;

        const BRANCHES: usize = 2;
        let (tx, mut rx) = mpsc::channel::<Result<Branch>>(BRANCHES);
        let mut branches = JoinSet::new();

        {
            let client = self.client.clone();
            let tx = tx.clone();
            let request_id = request_id.clone();
            branches.spawn(async move {
                let outcome = client
                    .get_json::<ArticleSummary>(NEWS_SERVICE, article_url)
                    .await
                    .map(Branch::Article);
                if let Err(e) = &outcome {
                    error!(request_id = %request_id, error = %e, "failed to fetch article");
                }
                // Capacity equals branch count, so this never waits
                let _ = tx.send(outcome).await;
            });
        }

        {
            let client = self.client.clone();
            let tx = tx.clone();
            let request_id = request_id.clone();
            branches.spawn(async move {
                let outcome = client
                    .get_json::<Vec<CommentView>>(COMMENTS_SERVICE, comments_url)
                    .await
                    .map(Branch::Comments);
                if let Err(e) = &outcome {
                    error!(request_id = %request_id, error = %e, "failed to fetch comments");
                }
                let _ = tx.send(outcome).await;
            });
        }
        drop(tx);

        // Join barrier: both branches land before outcomes are inspected
        while let Some(joined) = branches.join_next().await {
            if let Err(e) = joined {
                error!(request_id = %request_id, error = %e, "fan-out branch panicked");
                return Err(Error::Other(format!("fan-out branch failed: {}", e)));
            }
        }

        let mut news = None;
        let mut comments = None;
        let mut first_error = None;
        while let Some(outcome) = rx.recv().await {
            match outcome {
                Ok(Branch::Article(article)) => news = Some(article),
                Ok(Branch::Comments(list)) => comments = Some(list),
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        if let Some(e) = first_error {
            error!(request_id = %request_id, error = %e, "concurrent request failed");
            return Err(e);
        }

        match (news, comments) {
            (Some(news), Some(comments)) => {
                debug!(
                    request_id = %request_id,
                    comment_count = comments.len(),
                    "assembled detailed article"
                );
                Ok(DetailedArticle { news, comments })
            }
            _ => Err(Error::Other("fan-out branch produced no result".to_string())),
        }
    }

    /// Validate a comment with the censorship service, then forward it for storage
    ///
    /// The censorship hop must answer 200 before the comments hop is attempted. The
    /// forwarded body is the caller's JSON object with `news_id` set to
    /// `article_id`. The comments service's answer is returned unchanged.
    ///
    /// # Errors
    /// - `Error::Validation` if the body is not a JSON object with non-empty `content`
    /// - `Error::CommentRejected` if censorship answers anything other than 200
    /// - upstream errors if either hop cannot be completed
    pub async fn add_comment(
        &self,
        article_id: &str,
        body: &[u8],
        request_id: &RequestId,
    ) -> Result<UpstreamResponse> {
        if article_id.trim().is_empty() {
            return Err(Error::Validation("invalid id format".to_string()));
        }

        let mut comment = parse_comment_body(body)?;

        let censor_url =
            UpstreamClient::endpoint(&self.censorship_url, &["check"], &[], request_id)?;
        let verdict = self
            .client
            .post_json(CENSORSHIP_SERVICE, censor_url, &comment)
            .await
            .inspect_err(|e| {
                error!(request_id = %request_id, error = %e, "failed to send censorship request");
            })?;

        if verdict.status != CENSORSHIP_APPROVED {
            warn!(
                request_id = %request_id,
                status = verdict.status,
                "comment rejected by censorship"
            );
            return Err(Error::CommentRejected {
                status: verdict.status,
            });
        }

        if let Some(object) = comment.as_object_mut() {
            object.insert(
                "news_id".to_string(),
                serde_json::Value::String(article_id.to_string()),
            );
        }

        let comments_url =
            UpstreamClient::endpoint(&self.comments_url, &["comments"], &[], request_id)?;
        let stored = self
            .client
            .post_json(COMMENTS_SERVICE, comments_url, &comment)
            .await
            .inspect_err(|e| {
                error!(request_id = %request_id, error = %e, "failed to send comment");
            })?;

        info!(
            request_id = %request_id,
            article_id,
            status = stored.status,
            "comment forwarded to comments service"
        );

        Ok(stored)
    }

    /// Proxy a news list request
    ///
    /// With a page number this calls `/news?page=N`, otherwise the latest
    /// `/news/40`.
    pub async fn list_news(
        &self,
        page: Option<&str>,
        request_id: &RequestId,
    ) -> Result<UpstreamResponse> {
        let url = match page.filter(|p| !p.is_empty()) {
            Some(page) => {
                UpstreamClient::endpoint(&self.news_url, &["news"], &[("page", page)], request_id)?
            }
            None => UpstreamClient::endpoint(
                &self.news_url,
                &["news", DEFAULT_NEWS_LIMIT],
                &[],
                request_id,
            )?,
        };

        self.client.get(NEWS_SERVICE, url).await.inspect_err(|e| {
            error!(request_id = %request_id, error = %e, "failed to get news list");
        })
    }

    /// Proxy a news search request
    ///
    /// # Errors
    /// Returns `Error::Validation` for an empty query without calling upstream
    pub async fn filter_news(&self, query: &str, request_id: &RequestId) -> Result<UpstreamResponse> {
        if query.is_empty() {
            return Err(Error::Validation("missing search query".to_string()));
        }

        let url =
            UpstreamClient::endpoint(&self.news_url, &["news", "filter"], &[("s", query)], request_id)?;

        self.client.get(NEWS_SERVICE, url).await.inspect_err(|e| {
            error!(request_id = %request_id, error = %e, "failed to get filtered news");
        })
    }
}

/// Accept only a JSON object carrying a non-empty string `content`
fn parse_comment_body(body: &[u8]) -> Result<serde_json::Value> {
    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| Error::Validation(format!("failed to read body: {}", e)))?;

    let has_content = value
        .get("content")
        .and_then(|c| c.as_str())
        .is_some_and(|c| !c.trim().is_empty());

    if !value.is_object() || !has_content {
        return Err(Error::Validation(
            "comment body must be a JSON object with non-empty content".to_string(),
        ));
    }

    Ok(value)
}
