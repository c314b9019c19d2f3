use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::directory::Directory;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    /// Identity-provider directory. Behind a trait so the admin probe can
    /// run against a stub in tests.
    pub directory: Arc<dyn Directory>,
}
