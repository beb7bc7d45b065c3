//! Survey storage server
//!
//! MongoDB-backed storage for survey documents and their versions,
//! replacing the browser localStorage implementation with a shared
//! server-side store.

mod config;
mod db;
mod error;
mod models;
mod routes;
mod services;
mod state;

use anyhow::Result;
use axum::{
    extract::State, http::HeaderValue, http::StatusCode, response::Json, routing::get, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::MongoDb;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "survey_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Starting survey server on {}:{}", config.host, config.port);

    // Connect to the store. A failure here is fatal; the server does not
    // start without its database.
    info!("Connecting to database: {}", config.database_url);
    let db = MongoDb::connect(&config.database_url, &config.database_name).await?;

    // Create app state
    let state = Arc::new(AppState {
        db: Arc::new(db),
        config: config.clone(),
    });

    // Build router
    let app = build_router(state);

    // Start server
    let addr = SocketAddr::new(config.host.parse()?, config.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    // CORS configuration: explicit origin list from config, wide open only
    // if none parse
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origin_list()
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    let cors = if origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Service meta routes
    let meta_routes = Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .with_state(state.clone());

    Router::new()
        .merge(meta_routes)
        .merge(routes::configure(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Survey Generator API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "MongoDB-backed survey storage API"
    }))
}

async fn health_check(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    match state.db.ping().await {
        Ok(_) => Ok(Json(serde_json::json!({
            "status": "healthy",
            "database": "connected",
            "version": env!("CARGO_PKG_VERSION")
        }))),
        Err(_) => Err(StatusCode::SERVICE_UNAVAILABLE),
    }
}
