//! Consumers on the far side of the ingestion channels

use crate::error::Error;
use crate::storage::PostStore;
use crate::types::FeedBatch;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Totals for one consumer run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PersistStats {
    /// Records stored
    pub stored: u64,
    /// Records that failed to store
    pub failed: u64,
}

/// Persists every record of every batch, one at a time
pub struct PersistenceConsumer {
    store: Arc<dyn PostStore>,
}

impl PersistenceConsumer {
    /// Create a consumer writing into `store`
    pub fn new(store: Arc<dyn PostStore>) -> Self {
        Self { store }
    }

    /// Store one batch; a failing record is logged and skipped
    pub async fn persist_batch(&self, batch: &FeedBatch) -> PersistStats {
        let mut stats = PersistStats::default();

        for record in &batch.records {
            match self.store.add_post(record).await {
                Ok(post) => {
                    debug!(feed = %batch.feed_url, post_id = post.id, link = %post.link, "stored post");
                    stats.stored += 1;
                }
                Err(e) => {
                    warn!(feed = %batch.feed_url, link = %record.link, error = %e, "failed to store post");
                    stats.failed += 1;
                }
            }
        }

        stats
    }

    /// Drain `batches` until the channel closes or `cancel` fires
    pub async fn run(
        self,
        cancel: CancellationToken,
        mut batches: mpsc::Receiver<FeedBatch>,
    ) -> PersistStats {
        let mut total = PersistStats::default();

        loop {
            let batch = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                batch = batches.recv() => match batch {
                    Some(batch) => batch,
                    None => break,
                },
            };

            let stats = self.persist_batch(&batch).await;
            total.stored += stats.stored;
            total.failed += stats.failed;
        }

        info!(stored = total.stored, failed = total.failed, "persistence consumer stopped");
        total
    }
}

/// Log ingestion errors until the channel closes or `cancel` fires
///
/// Returns the number of errors seen.
pub async fn log_errors(cancel: CancellationToken, mut errors: mpsc::Receiver<Error>) -> u64 {
    let mut seen = 0;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            err = errors.recv() => match err {
                Some(e) => {
                    seen += 1;
                    warn!(error = %e, "feed ingestion error");
                }
                None => break,
            },
        }
    }

    seen
}
