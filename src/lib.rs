//! # newsgate
//!
//! Concurrency core of a small news platform.
//!
//! ## Components
//!
//! - **Gateway orchestration** ([`orchestrator`], [`api`]) - the composite article view
//!   fans out to the article and comments services concurrently and is all-or-nothing;
//!   comment submission is a censorship → comments chain that short-circuits on
//!   rejection. Every outbound call carries the inbound request's correlation id
//!   ([`correlation`]).
//! - **Feed ingestion** ([`feeds`]) - polls RSS/Atom feeds on a fixed period and streams
//!   normalized records to a persistence consumer.
//! - **Moderation** ([`moderation`]) - periodically flips pending comments to allowed or
//!   blocked based on a banned-word list.
//!
//! The two periodic jobs share storage ([`db`]) without coordination and stop on one
//! shared cancellation token.
//!
//! ## Quick Start
//!
//! ```no_run
//! use newsgate::{Config, Newsgate, run_with_shutdown};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.json")?;
//!     let gate = Newsgate::start(config).await?;
//!
//!     // Runs until SIGTERM/SIGINT
//!     run_with_shutdown(gate).await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Gateway HTTP server
pub mod api;
/// Configuration types
pub mod config;
/// Request correlation ids
pub mod correlation;
/// Database persistence layer
pub mod db;
/// Error types
pub mod error;
/// Feed ingestion pipeline
pub mod feeds;
/// Comment moderation sweeps
pub mod moderation;
/// Upstream fan-out and proxy chains
pub mod orchestrator;
/// Recurring job schedules
pub mod schedule;
/// Background service wiring
pub mod services;
/// Storage collaborator traits
pub mod storage;
/// Core types
pub mod types;
/// Bounded-timeout upstream HTTP client
pub mod upstream;

// Re-export commonly used types
pub use config::Config;
pub use correlation::RequestId;
pub use db::Database;
pub use error::{ApiError, DatabaseError, Error, ErrorDetail, Result, ToHttpStatus};
pub use feeds::FeedIngestionPipeline;
pub use moderation::{BannedWords, ModerationSweeper, SweepReport};
pub use orchestrator::Orchestrator;
pub use schedule::RecurringSchedule;
pub use services::Newsgate;
pub use storage::{CommentStore, PostStore};
pub use types::{
    ArticleSummary, Comment, CommentView, DetailedArticle, FeedBatch, FeedRecord, NewComment,
    Post, Visibility,
};

use tokio_util::sync::CancellationToken;

/// Helper function to run newsgate with graceful signal handling.
///
/// Waits for a termination signal and then calls [`Newsgate::shutdown`].
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
pub async fn run_with_shutdown(gate: Newsgate) -> Result<()> {
    let cancel = gate.cancel_token();

    // A task cancelling the token directly also ends the wait
    tokio::select! {
        _ = wait_for_signal() => {}
        _ = cancel.cancelled() => {}
    }

    gate.shutdown().await
}

/// Cancel `cancel` on the first termination signal
///
/// Returns once the token is cancelled, whether by a signal or by someone else.
pub async fn run_until_signal(cancel: CancellationToken) {
    tokio::select! {
        _ = wait_for_signal() => cancel.cancel(),
        _ = cancel.cancelled() => {}
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Set up signal handlers - these may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_run_until_signal_returns_when_token_cancelled_elsewhere() {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_until_signal(cancel.clone()));

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("should return after cancellation")
            .unwrap();
    }
}
