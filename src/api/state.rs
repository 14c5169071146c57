//! Application state for the gateway server

use crate::Result;
use crate::config::Config;
use crate::moderation::BannedWords;
use crate::orchestrator::Orchestrator;
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// This struct is cloned for each request (cheap Arc clone).
#[derive(Clone)]
pub struct AppState {
    /// Upstream orchestration for the gateway routes
    pub orchestrator: Arc<Orchestrator>,

    /// Matcher behind `POST /check`
    pub banned: Arc<BannedWords>,

    /// Configuration (read-only)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(orchestrator: Arc<Orchestrator>, banned: Arc<BannedWords>, config: Arc<Config>) -> Self {
        Self {
            orchestrator,
            banned,
            config,
        }
    }

    /// Build the state from configuration alone
    ///
    /// # Errors
    /// Returns error if the upstream HTTP client cannot be created
    pub fn from_config(config: Arc<Config>) -> Result<Self> {
        let orchestrator = Arc::new(Orchestrator::new(&config.upstream)?);
        let banned = Arc::new(BannedWords::new(&config.moderation.banned_words));
        Ok(Self::new(orchestrator, banned, config))
    }
}
