//! HTTP routes

pub mod surveys;

use crate::state::AppState;
use axum::Router;
use std::sync::Arc;

/// Configure all API routes
pub fn configure(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(surveys::survey_routes())
        .with_state(state)
}
