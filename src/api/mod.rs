//! REST API module.
//!
//! Thin axum handlers: validate input, call the repository, shape the
//! response. Success payloads go out with 2xx, failures as `{ "error": … }`.

mod admin;
mod auth;
mod feeds;
mod projects;
mod store;
mod teams;
mod users;

pub use admin::*;
pub use auth::*;
pub use feeds::*;
pub use projects::*;
pub use store::*;
pub use teams::*;
pub use users::*;

use serde::Serialize;

use crate::auth::Session;
use crate::errors::AppError;
use crate::models::Member;
use crate::AppState;

/// Bare success acknowledgement.
#[derive(Debug, Serialize)]
pub struct AckResponse {
    pub success: bool,
}

/// Resolve the session to a member record, 404 when unregistered.
pub(crate) async fn require_user(
    state: &AppState,
    session: &Session,
) -> Result<Member, AppError> {
    state
        .repo
        .find_member_by_slack_id(&session.0)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}
