//! Team API endpoints.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::auth::Session;
use crate::errors::AppError;
use crate::models::{CreateTeamRequest, JoinTeamRequest, Team, TeamVisibility};
use crate::AppState;

use super::{require_user, AckResponse};

#[derive(Debug, Serialize)]
pub struct TeamsResponse {
    pub teams: Vec<Team>,
}

/// GET /api/teams - List all teams with XP-enriched rosters.
pub async fn list_teams(State(state): State<AppState>) -> Result<Json<TeamsResponse>, AppError> {
    let teams = state.repo.list_teams().await?;
    Ok(Json(TeamsResponse { teams }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamResponse {
    pub success: bool,
    pub team_id: String,
}

/// POST /api/teams/create - Create a team with the caller as sole member.
pub async fn create_team(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<CreateTeamRequest>,
) -> Result<Json<CreateTeamResponse>, AppError> {
    if request.team_name.is_empty() || request.team_type.is_empty() {
        return Err(AppError::Validation(
            "Team name and type are required".to_string(),
        ));
    }
    let visibility = TeamVisibility::from_str(&request.team_type)
        .ok_or_else(|| AppError::Validation("Invalid team type".to_string()))?;

    let user = require_user(&state, &session).await?;
    let team_id = state
        .repo
        .create_team(&user, &request.team_name, visibility)
        .await?;

    Ok(Json(CreateTeamResponse {
        success: true,
        team_id,
    }))
}

/// POST /api/teams/join - Join an open team.
pub async fn join_team(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<JoinTeamRequest>,
) -> Result<Json<AckResponse>, AppError> {
    if request.team_id.is_empty() {
        return Err(AppError::Validation("Team ID is required".to_string()));
    }

    let user = require_user(&state, &session).await?;
    state.repo.join_team(&user, &request.team_id).await?;

    Ok(Json(AckResponse { success: true }))
}

/// POST /api/teams/request - File a join request with an invite-only team.
pub async fn request_join(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<JoinTeamRequest>,
) -> Result<Json<AckResponse>, AppError> {
    if request.team_id.is_empty() {
        return Err(AppError::Validation("Team ID is required".to_string()));
    }

    let user = require_user(&state, &session).await?;
    state.repo.request_join(&user, &request.team_id).await?;

    Ok(Json(AckResponse { success: true }))
}

/// POST /api/teams/leave - Leave the current team.
pub async fn leave_team(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<AckResponse>, AppError> {
    let user = require_user(&state, &session).await?;
    state.repo.leave_team(&user).await?;

    Ok(Json(AckResponse { success: true }))
}
