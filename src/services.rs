//! Background service starters: feed ingestion, moderation sweeper and the gateway.
//!
//! Every task observes one shared [`CancellationToken`]. [`Newsgate::shutdown`]
//! cancels it and waits for the tasks to wind down.

use crate::api::{self, AppState};
use crate::config::Config;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::feeds::{
    BATCH_CHANNEL_CAPACITY, ERROR_CHANNEL_CAPACITY, FeedIngestionPipeline, PersistStats,
    PersistenceConsumer, log_errors,
};
use crate::moderation::ModerationSweeper;
use crate::storage::{CommentStore, PostStore};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Tasks making up the ingestion pipeline
pub struct IngestionTasks {
    /// Feed poller; yields the number of cycles run
    pub producer: JoinHandle<u64>,
    /// Persistence consumer; yields store totals
    pub consumer: JoinHandle<PersistStats>,
    /// Error logger; yields the number of errors seen
    pub error_log: JoinHandle<u64>,
}

/// Start the feed poller, its persistence consumer and its error logger
///
/// The consumer and logger stop on their own once the poller finishes and drops its
/// channel ends, so a single-cycle pipeline winds down without cancellation.
pub fn spawn_ingestion(
    pipeline: FeedIngestionPipeline,
    store: Arc<dyn PostStore>,
    cancel: &CancellationToken,
) -> IngestionTasks {
    let (batch_tx, batch_rx) = mpsc::channel(BATCH_CHANNEL_CAPACITY);
    let (error_tx, error_rx) = mpsc::channel(ERROR_CHANNEL_CAPACITY);

    let producer = tokio::spawn({
        let cancel = cancel.clone();
        async move { pipeline.run(cancel, batch_tx, error_tx).await }
    });

    let consumer = tokio::spawn(PersistenceConsumer::new(store).run(cancel.clone(), batch_rx));
    let error_log = tokio::spawn(log_errors(cancel.clone(), error_rx));

    tracing::info!("Feed ingestion background tasks started");

    IngestionTasks {
        producer,
        consumer,
        error_log,
    }
}

/// Start the periodic moderation sweeper
pub fn spawn_moderation(sweeper: ModerationSweeper, cancel: &CancellationToken) -> JoinHandle<u64> {
    let cancel = cancel.clone();
    let handle = tokio::spawn(async move { sweeper.run(cancel).await });

    tracing::info!("Moderation sweeper background task started");

    handle
}

/// A running newsgate instance
pub struct Newsgate {
    config: Arc<Config>,
    db: Arc<Database>,
    cancel: CancellationToken,
    api_address: SocketAddr,
    api: JoinHandle<Result<()>>,
    ingestion: IngestionTasks,
    moderation: JoinHandle<u64>,
}

impl Newsgate {
    /// Open storage, bind the gateway and start every background task
    ///
    /// # Errors
    /// Storage that cannot be opened, an HTTP client that cannot be built and a bind
    /// address that cannot be bound are fatal here. Everything after startup is
    /// handled inside the tasks.
    pub async fn start(config: Config) -> Result<Self> {
        let config = Arc::new(config);
        let cancel = CancellationToken::new();

        let db = Arc::new(Database::new(&config.database_path).await?);
        let state = AppState::from_config(config.clone())?;
        let pipeline = FeedIngestionPipeline::from_config(&config)?;

        let listener = TcpListener::bind(config.api.bind_address)
            .await
            .map_err(Error::Io)?;
        let api_address = listener.local_addr().map_err(Error::Io)?;

        let api = tokio::spawn(api::serve(listener, state, cancel.clone()));

        let posts: Arc<dyn PostStore> = db.clone();
        let ingestion = spawn_ingestion(pipeline, posts, &cancel);

        let comments: Arc<dyn CommentStore> = db.clone();
        let sweeper = ModerationSweeper::from_config(comments, &config.moderation);
        let moderation = spawn_moderation(sweeper, &cancel);

        tracing::info!(
            address = %api_address,
            feeds = config.rss.len(),
            "newsgate started"
        );

        Ok(Self {
            config,
            db,
            cancel,
            api_address,
            api,
            ingestion,
            moderation,
        })
    }

    /// The effective configuration
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Shared storage
    pub fn database(&self) -> &Arc<Database> {
        &self.db
    }

    /// Address the gateway is listening on
    pub fn api_address(&self) -> SocketAddr {
        self.api_address
    }

    /// Token observed by every task; cancelling it begins shutdown
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancel every task, wait for them and close storage
    ///
    /// # Errors
    /// Returns the gateway's error if it stopped abnormally
    pub async fn shutdown(self) -> Result<()> {
        tracing::info!("newsgate shutting down");
        self.cancel.cancel();

        let api_result = match self.api.await {
            Ok(result) => result,
            Err(e) => Err(Error::ApiServerError(format!("API task failed: {}", e))),
        };

        if let Err(e) = self.ingestion.producer.await {
            tracing::error!(error = %e, "feed poller task failed");
        }
        match self.ingestion.consumer.await {
            Ok(stats) => tracing::info!(stored = stats.stored, failed = stats.failed, "persistence totals"),
            Err(e) => tracing::error!(error = %e, "persistence consumer task failed"),
        }
        if let Err(e) = self.ingestion.error_log.await {
            tracing::error!(error = %e, "error logger task failed");
        }
        if let Err(e) = self.moderation.await {
            tracing::error!(error = %e, "moderation task failed");
        }

        self.db.pool().close().await;
        tracing::info!("newsgate stopped");

        api_result
    }
}
