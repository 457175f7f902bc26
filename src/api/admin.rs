//! Admin API endpoints, gated by the fetched admin-id list.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::auth::{self, MaybeSession, Session};
use crate::errors::AppError;
use crate::models::{Member, PurchaseRecord};
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckAuthResponse {
    pub is_admin: bool,
}

/// GET /api/admin/check-auth - Is the caller an admin?
///
/// Answers `isAdmin: false` with the matching status instead of the error
/// envelope, mirroring what the admin panel expects.
pub async fn check_auth(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
) -> (StatusCode, Json<CheckAuthResponse>) {
    let Some(slack_user_id) = session else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(CheckAuthResponse { is_admin: false }),
        );
    };

    let is_admin = auth::is_admin(&state.http, &state.config.admin_config_url, &slack_user_id).await;
    (StatusCode::OK, Json(CheckAuthResponse { is_admin }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserBody {
    pub id: String,
    pub name: String,
    pub email: String,
    pub slack_id: String,
    pub slack_name: String,
    pub xp: i64,
    pub team_id: String,
    pub team_name: String,
    pub invite_id: String,
    pub banned: bool,
    pub banreason: String,
    pub purchased_items: Vec<PurchaseRecord>,
}

#[derive(Debug, Serialize)]
pub struct AdminUserResponse {
    pub user: AdminUserBody,
}

impl AdminUserBody {
    fn from_member(member: Member, team_name: String) -> Self {
        Self {
            id: member.record_id.clone(),
            name: member.name,
            email: member.email,
            slack_id: member.slack_id,
            slack_name: member.slack_name,
            xp: member.xp,
            team_id: member.team_id,
            team_name,
            invite_id: member.invite_id,
            banned: member.banned,
            banreason: member.ban_reason,
            purchased_items: member.purchases,
        }
    }
}

/// GET /api/admin/user/{inviteId} - Look a member up by invite id.
pub async fn user_by_invite_id(
    State(state): State<AppState>,
    session: Session,
    Path(invite_id): Path<String>,
) -> Result<Json<AdminUserResponse>, AppError> {
    let is_admin = auth::is_admin(&state.http, &state.config.admin_config_url, &session.0).await;
    if !is_admin {
        return Err(AppError::Forbidden("Not authorized".to_string()));
    }

    let member = state
        .repo
        .find_member_by_invite_id(&invite_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let team_name = state
        .repo
        .team_name_or(&member.team_id, "No Team Assigned")
        .await;

    Ok(Json(AdminUserResponse {
        user: AdminUserBody::from_member(member, team_name),
    }))
}
