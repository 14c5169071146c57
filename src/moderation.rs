//! Periodic comment moderation
//!
//! Each sweep loads every pending comment, decides its visibility from its content
//! alone and writes the decision back with a point update. Failures are per comment:
//! a row that cannot be decoded or updated is logged and the sweep moves on.
//!
//! No claim or lock is taken on the rows. A comment edited between the read and the
//! write keeps the decision made for the content that was read.

use crate::config::ModerationConfig;
use crate::schedule::RecurringSchedule;
use crate::storage::CommentStore;
use crate::types::Visibility;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Banned substrings used when none are configured
pub const DEFAULT_BANNED_WORDS: &[&str] = &["qwerty", "йцукен", "zxcvbnm"];

/// Case-insensitive banned-substring matcher
#[derive(Clone, Debug)]
pub struct BannedWords {
    words: Vec<String>,
}

impl BannedWords {
    /// Build a matcher; blank entries are ignored
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();

        Self { words }
    }

    /// The lowercased banned words
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// First banned word found in `text`, if any
    pub fn find(&self, text: &str) -> Option<&str> {
        let lowered = text.to_lowercase();
        self.words
            .iter()
            .find(|w| lowered.contains(w.as_str()))
            .map(String::as_str)
    }

    /// Whether `text` contains any banned word
    pub fn contains_banned(&self, text: &str) -> bool {
        self.find(text).is_some()
    }

    /// Whether `text` may be shown
    pub fn is_allowed(&self, text: &str) -> bool {
        !self.contains_banned(text)
    }
}

impl Default for BannedWords {
    fn default() -> Self {
        Self::new(DEFAULT_BANNED_WORDS)
    }
}

/// Outcome counts of one sweep
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Pending comments returned by the query, including undecodable ones
    pub examined: usize,
    /// Comments switched to allowed
    pub allowed: usize,
    /// Comments switched to blocked
    pub blocked: usize,
    /// Comments skipped because they could not be decoded or updated
    pub failed: usize,
}

/// Runs moderation sweeps over a [`CommentStore`]
pub struct ModerationSweeper {
    store: Arc<dyn CommentStore>,
    matcher: BannedWords,
    schedule: RecurringSchedule,
}

impl ModerationSweeper {
    /// Create a sweeper
    pub fn new(store: Arc<dyn CommentStore>, matcher: BannedWords, schedule: RecurringSchedule) -> Self {
        Self {
            store,
            matcher,
            schedule,
        }
    }

    /// Create a sweeper from configuration
    pub fn from_config(store: Arc<dyn CommentStore>, config: &ModerationConfig) -> Self {
        Self::new(
            store,
            BannedWords::new(&config.banned_words),
            RecurringSchedule::every(config.interval),
        )
    }

    /// The matcher deciding visibility
    pub fn matcher(&self) -> &BannedWords {
        &self.matcher
    }

    /// Evaluate every pending comment once
    ///
    /// Only a failure of the pending query itself aborts the sweep; that is logged and
    /// an empty report returned.
    pub async fn sweep(&self) -> SweepReport {
        let mut report = SweepReport::default();

        let pending = match self.store.pending_comments().await {
            Ok(pending) => pending,
            Err(e) => {
                warn!(error = %e, "failed to query pending comments");
                return report;
            }
        };

        report.examined = pending.len();

        for entry in pending {
            let comment = match entry {
                Ok(comment) => comment,
                Err(e) => {
                    warn!(error = %e, "skipping undecodable comment");
                    report.failed += 1;
                    continue;
                }
            };

            let banned = self.matcher.find(&comment.content).map(str::to_string);
            let visibility = Visibility::from_allowed(banned.is_none());

            if let Err(e) = self.store.set_visibility(comment.id, visibility).await {
                warn!(comment_id = comment.id, error = %e, "failed to update comment visibility");
                report.failed += 1;
                continue;
            }

            match banned {
                Some(word) => {
                    warn!(comment_id = comment.id, news_id = %comment.news_id, word = %word, "comment blocked");
                    report.blocked += 1;
                }
                None => {
                    debug!(comment_id = comment.id, "comment allowed");
                    report.allowed += 1;
                }
            }
        }

        if report.examined > 0 {
            info!(
                examined = report.examined,
                allowed = report.allowed,
                blocked = report.blocked,
                failed = report.failed,
                "moderation sweep complete"
            );
        }

        report
    }

    /// Sweep on every schedule tick until `cancel` fires
    ///
    /// Returns the number of sweeps run.
    pub async fn run(&self, cancel: CancellationToken) -> u64 {
        info!(period = ?self.schedule.period(), "moderation sweeper started");

        let sweeps = self
            .schedule
            .run(&cancel, || async {
                self.sweep().await;
            })
            .await;

        info!(sweeps, "moderation sweeper stopped");
        sweeps
    }
}
