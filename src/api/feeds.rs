//! Read-only feed endpoints: events, news, global settings.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::errors::AppError;
use crate::models::{Event, NewsPost, Settings};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct EventsResponse {
    pub events: Vec<Event>,
}

/// GET /api/events - Schedule, day then hour ascending.
pub async fn list_events(State(state): State<AppState>) -> Result<Json<EventsResponse>, AppError> {
    let events = state.repo.list_events().await?;
    Ok(Json(EventsResponse { events }))
}

#[derive(Debug, Serialize)]
pub struct NewsResponse {
    pub news: Vec<NewsPost>,
}

/// GET /api/news - News posts, newest first.
pub async fn list_news(State(state): State<AppState>) -> Result<Json<NewsResponse>, AppError> {
    let news = state.repo.list_news().await?;
    Ok(Json(NewsResponse { news }))
}

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub settings: Settings,
}

/// GET /api/settings - Feature flags, fetched fresh per request.
pub async fn get_settings(
    State(state): State<AppState>,
) -> Result<Json<SettingsResponse>, AppError> {
    let settings = state.repo.settings().await?;
    Ok(Json(SettingsResponse { settings }))
}
