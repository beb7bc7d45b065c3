//! Application state

use crate::config::Config;
use crate::db::MongoDb;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Process-wide database handle, read-only after startup
    pub db: Arc<MongoDb>,

    /// Server configuration
    pub config: Config,
}
