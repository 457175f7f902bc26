//! Profile and leaderboard endpoints.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::auth::MaybeSession;
use crate::errors::AppError;
use crate::models::{PurchaseRecord, RankedMember, TeamStanding};
use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileBody {
    pub id: String,
    pub name: String,
    pub email: String,
    pub xp: i64,
    pub team_id: String,
    pub team_name: String,
    pub invite_id: String,
    pub purchased_items: Vec<PurchaseRecord>,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<ProfileBody>,
}

/// GET /api/user/me - The caller's profile, or `authenticated: false`.
///
/// Always 200; an absent cookie or unregistered caller is not an error here.
pub async fn me(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
) -> Result<Json<MeResponse>, AppError> {
    let Some(slack_user_id) = session else {
        return Ok(Json(MeResponse {
            authenticated: false,
            user: None,
        }));
    };

    let Some(user) = state.repo.find_member_by_slack_id(&slack_user_id).await? else {
        return Ok(Json(MeResponse {
            authenticated: false,
            user: None,
        }));
    };

    let team_name = state
        .repo
        .team_name_or(&user.team_id, "No Team Assigned")
        .await;

    Ok(Json(MeResponse {
        authenticated: true,
        user: Some(ProfileBody {
            id: user.slack_id,
            name: user.name,
            email: user.email,
            xp: user.xp,
            team_id: user.team_id,
            team_name,
            invite_id: user.invite_id,
            purchased_items: user.purchases,
        }),
    }))
}

#[derive(Debug, Serialize)]
pub struct LeaderboardResponse {
    pub users: Vec<RankedMember>,
    pub teams: Vec<TeamStanding>,
}

/// GET /api/leaderboard - Individual and team rankings.
pub async fn leaderboard(
    State(state): State<AppState>,
) -> Result<Json<LeaderboardResponse>, AppError> {
    let (users, teams) = state.repo.leaderboard().await?;
    Ok(Json(LeaderboardResponse { users, teams }))
}
