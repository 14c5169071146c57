//! Periodic feed ingestion
//!
//! The [`FeedIngestionPipeline`] polls every configured feed in order, once per
//! schedule tick, and emits each feed's parsed records as one [`FeedBatch`] on the
//! batch channel. Per-feed failures go to a separate error channel and the cycle moves
//! on to the next feed. The pipeline never writes to storage itself; the
//! [`PersistenceConsumer`] on the other end of the batch channel does.
//!
//! Cancellation is cooperative: the token is checked before every feed and every
//! emission, and every fetch or channel send races it.

mod consumer;
mod fetcher;
mod parser;

pub use consumer::{PersistStats, PersistenceConsumer, log_errors};
pub use fetcher::{FeedFetcher, MAX_ERROR_BODY};
pub use parser::{parse_feed, parse_pub_date, strip_tags};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::schedule::RecurringSchedule;
use crate::types::{FeedBatch, FeedRecord};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Batch channel capacity; one slot so the producer waits for the consumer
pub const BATCH_CHANNEL_CAPACITY: usize = 1;

/// Error channel capacity
pub const ERROR_CHANNEL_CAPACITY: usize = 16;

/// How a single poll cycle ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Every feed was visited
    Completed {
        /// Feeds whose batch was emitted
        emitted: usize,
        /// Feeds that failed to fetch or parse
        failed: usize,
    },
    /// Cancellation was observed before the cycle finished
    Cancelled,
    /// The batch consumer has gone away
    ConsumerClosed,
}

/// Polls a fixed list of feeds on a schedule
#[derive(Clone, Debug)]
pub struct FeedIngestionPipeline {
    feeds: Vec<String>,
    schedule: RecurringSchedule,
    fetcher: FeedFetcher,
}

impl FeedIngestionPipeline {
    /// Create a pipeline over `feeds` (already normalized) driven by `schedule`
    pub fn new(feeds: Vec<String>, schedule: RecurringSchedule, fetcher: FeedFetcher) -> Self {
        Self {
            feeds,
            schedule,
            fetcher,
        }
    }

    /// Build from configuration: feed list, poll period and feed timeout
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            config.rss.clone(),
            RecurringSchedule::from_period(config.poll_period()),
            FeedFetcher::new(config.feed_timeout)?,
        ))
    }

    /// The feeds visited on each cycle, in order
    pub fn feeds(&self) -> &[String] {
        &self.feeds
    }

    /// The schedule driving the cycles
    pub fn schedule(&self) -> RecurringSchedule {
        self.schedule
    }

    /// Run cycles until the schedule ends, `cancel` fires or the batch consumer closes
    ///
    /// Returns the number of cycles started.
    pub async fn run(
        &self,
        cancel: CancellationToken,
        batches: mpsc::Sender<FeedBatch>,
        errors: mpsc::Sender<Error>,
    ) -> u64 {
        info!(
            feeds = self.feeds.len(),
            recurring = self.schedule.is_recurring(),
            "feed ingestion started"
        );

        // Child token so a closed consumer stops the schedule without touching the parent
        let local = cancel.child_token();
        let (batches, errors, token) = (&batches, &errors, &local);

        let cycles = self
            .schedule
            .run(&local, move || async move {
                if self.run_cycle(token, batches, errors).await == CycleOutcome::ConsumerClosed {
                    warn!("batch consumer closed, stopping feed ingestion");
                    token.cancel();
                }
            })
            .await;

        info!(cycles, "feed ingestion stopped");
        cycles
    }

    /// Visit every feed once, in order
    pub async fn run_cycle(
        &self,
        cancel: &CancellationToken,
        batches: &mpsc::Sender<FeedBatch>,
        errors: &mpsc::Sender<Error>,
    ) -> CycleOutcome {
        let mut emitted = 0;
        let mut failed = 0;

        for url in &self.feeds {
            if cancel.is_cancelled() {
                return CycleOutcome::Cancelled;
            }

            let fetched = tokio::select! {
                biased;
                _ = cancel.cancelled() => return CycleOutcome::Cancelled,
                result = self.fetch_and_parse(url) => result,
            };

            let records = match fetched {
                Ok(records) => records,
                Err(e) => {
                    failed += 1;
                    debug!(url = %url, error = %e, "feed failed, moving on");
                    // The error channel is best-effort
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return CycleOutcome::Cancelled,
                        _ = errors.send(e) => {}
                    }
                    continue;
                }
            };

            if cancel.is_cancelled() {
                return CycleOutcome::Cancelled;
            }

            let batch = FeedBatch {
                feed_url: url.clone(),
                records,
            };
            let count = batch.records.len();

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return CycleOutcome::Cancelled,
                sent = batches.send(batch) => {
                    if sent.is_err() {
                        return CycleOutcome::ConsumerClosed;
                    }
                }
            }

            debug!(url = %url, records = count, "emitted feed batch");
            emitted += 1;
        }

        CycleOutcome::Completed { emitted, failed }
    }

    async fn fetch_and_parse(&self, url: &str) -> Result<Vec<FeedRecord>> {
        let content = self.fetcher.fetch(url).await?;
        parse_feed(url, &content)
    }
}
