use std::sync::Arc;

use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::storage::Storage;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Pluggable storage backend: in-memory or PostgreSQL, chosen from config.
    pub storage: Arc<dyn Storage>,
    pub llm: LlmClient,
    pub config: Config,
}
