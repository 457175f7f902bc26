//! Lodge Portal Backend
//!
//! REST backend for a hackathon participant portal: Slack-OAuth login, an XP
//! economy and store, team formation, project tracking with devlogs and
//! Hackatime hours, plus chat-bot command surfaces over the same data. The
//! external document store is the system of record.

mod api;
mod auth;
mod bot;
mod config;
mod db;
mod errors;
mod hackatime;
mod models;

use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::{HttpDatastore, Repository};
use hackatime::HackatimeClient;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub hackatime: Arc<HackatimeClient>,
    pub http: reqwest::Client,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env();

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Lodge Portal Backend");
    tracing::info!("Document store: {}", config.docstore_base_url);
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.docstore_api_key.is_empty() {
        tracing::warn!("No document-store API key configured (LODGE_DOCSTORE_API_KEY)");
    }

    // Wire up the external services
    let store = Arc::new(HttpDatastore::new(
        &config.docstore_base_url,
        &config.docstore_api_key,
    ));
    let repo = Arc::new(Repository::new(store, config.databases.clone()));
    let hackatime = Arc::new(HackatimeClient::new(&config.hackatime_base_url));

    // Create application state
    let state = AppState {
        repo,
        hackatime,
        http: reqwest::Client::new(),
        config: Arc::new(config.clone()),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Auth
        .route("/auth/slack", get(api::slack_start))
        .route("/auth/callback", get(api::slack_callback))
        .route("/auth/logout", post(api::logout))
        .route("/auth/invite", post(api::invite_login))
        // Profile
        .route("/user/me", get(api::me))
        .route("/leaderboard", get(api::leaderboard))
        // Store
        .route("/store", get(api::list_store_items))
        .route("/store/purchase", post(api::purchase))
        .route("/store/toggle-usage", post(api::toggle_usage))
        // Teams
        .route("/teams", get(api::list_teams))
        .route("/teams/create", post(api::create_team))
        .route("/teams/join", post(api::join_team))
        .route("/teams/leave", post(api::leave_team))
        .route("/teams/request", post(api::request_join))
        // Projects
        .route("/projects", get(api::list_projects))
        .route("/projects/create", post(api::create_project))
        .route("/projects/{id}", get(api::get_project))
        .route("/projects/{id}", put(api::update_project))
        .route("/projects/{id}/devlogs", post(api::add_devlog))
        .route("/projects/{id}/hackatime", post(api::link_hackatime))
        .route("/projects/{id}/hackatime", delete(api::unlink_hackatime))
        // Feeds
        .route("/events", get(api::list_events))
        .route("/news", get(api::list_news))
        .route("/settings", get(api::get_settings))
        // Admin
        .route("/admin/check-auth", get(api::check_auth))
        .route("/admin/user/{inviteId}", get(api::user_by_invite_id));

    // Bot dispatch endpoints
    let bot_routes = Router::new()
        .route("/slack/commands", post(bot::slack::dispatch))
        .route("/discord/commands", post(bot::discord::dispatch));

    // Health check
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(bot_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests;
