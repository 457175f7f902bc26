//! Member model and the purchase ledger embedded in it.

use serde::{Deserialize, Serialize};

/// A registered portal member backed by a page in the members database.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    /// Document-store page id, needed for updates
    #[serde(skip)]
    pub record_id: String,
    pub name: String,
    pub email: String,
    pub slack_id: String,
    pub slack_name: String,
    pub xp: i64,
    /// Empty string means unassigned
    pub team_id: String,
    pub banned: bool,
    pub ban_reason: String,
    pub invite_id: String,
    #[serde(default)]
    pub purchases: Vec<PurchaseRecord>,
}

impl Member {
    pub fn has_team(&self) -> bool {
        !self.team_id.is_empty()
    }
}

/// One purchase in a member's ledger.
///
/// `item_name`, `category` and `xp_price` are snapshots taken at purchase
/// time and must not be re-derived from the live catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRecord {
    /// Stable id; records written before ids existed parse without one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub item_id: String,
    pub item_name: String,
    pub category: String,
    pub xp_price: i64,
    pub purchased_at: String,
    pub used: bool,
    pub used_at: Option<String>,
}

/// A member row on the individual leaderboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedMember {
    pub id: String,
    pub name: String,
    pub slack_name: String,
    pub xp: i64,
    pub team_id: String,
    pub team_name: String,
    pub rank: usize,
}

/// Request body for the demo invite-code login.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteLoginRequest {
    #[serde(default)]
    pub invite_code: String,
}
