//! Team roster models.

use serde::{Deserialize, Serialize};

/// Who may join a team, and how.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TeamVisibility {
    Public,
    Private,
    #[serde(rename = "Ask for invite")]
    AskForInvite,
}

impl TeamVisibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamVisibility::Public => "Public",
            TeamVisibility::Private => "Private",
            TeamVisibility::AskForInvite => "Ask for invite",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Public" => Some(TeamVisibility::Public),
            "Private" => Some(TeamVisibility::Private),
            "Ask for invite" => Some(TeamVisibility::AskForInvite),
            _ => None,
        }
    }
}

/// One entry in a team's member array.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterMember {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slack_name: String,
    /// Filled only when a listing enriches the roster; never stored
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xp: Option<i64>,
}

/// Status of a pending membership application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinRequestStatus {
    Pending,
    Approved,
    Rejected,
}

/// A membership application to an "Ask for invite" team.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slack_name: String,
    pub request_date: String,
    pub status: JoinRequestStatus,
}

/// A team backed by a page in the teams database.
///
/// `team_size` is denormalized and must be rewritten by every
/// membership-changing operation so it stays equal to `members.len()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    /// Document-store page id, needed for updates
    #[serde(rename = "id")]
    pub record_id: String,
    /// Generated team id, distinct from the page id
    pub team_id: String,
    pub name: String,
    pub team_size: i64,
    pub members: Vec<RosterMember>,
    pub projects: Vec<String>,
    pub join_requests: Vec<JoinRequest>,
    #[serde(rename = "type")]
    pub visibility: TeamVisibility,
    pub created_time: String,
    pub last_edited_time: String,
}

/// A team row on the team leaderboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamStanding {
    pub team_name: String,
    pub total_xp: i64,
    pub member_count: usize,
    pub average_xp: i64,
    pub rank: usize,
}

/// Request body for creating a team.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamRequest {
    #[serde(default)]
    pub team_name: String,
    #[serde(default)]
    pub team_type: String,
}

/// Request body for joining a team or requesting to join one.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinTeamRequest {
    #[serde(default)]
    pub team_id: String,
}
