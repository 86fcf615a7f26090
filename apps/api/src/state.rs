use std::sync::Arc;

use crate::applications::storage::ResumeStorage;
use crate::applications::store::ApplicationStore;
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Record store. Postgres when `DATABASE_URL` is set, in-memory otherwise.
    pub store: Arc<dyn ApplicationStore>,
    /// Resume file backend, local disk or S3.
    pub files: Arc<dyn ResumeStorage>,
    pub config: Config,
}
