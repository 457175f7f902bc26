//! Companion admin command surface, mirroring ban/approve/reject.
//!
//! Gated by a hardcoded id allow-list rather than the fetched admin config.

use std::collections::BTreeMap;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::ProjectStatus;
use crate::AppState;

/// Admin ids allowed to use this surface.
pub const ADMIN_IDS: &[&str] = &["483347547415642142"];

/// Accepted ban reasons.
pub const BAN_REASONS: &[&str] = &[
    "Harassment/bad speech",
    "Copy paste",
    "Multi-user account",
    "AI Fraud",
    "Hackatime Fraud",
    "Age Fraud",
];

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotCommand {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct BotResponse {
    pub content: String,
}

fn reply(content: String) -> Json<BotResponse> {
    Json(BotResponse { content })
}

/// POST /discord/commands - Dispatch one admin command.
pub async fn dispatch(
    State(state): State<AppState>,
    Json(command): Json<BotCommand>,
) -> Json<BotResponse> {
    if !ADMIN_IDS.contains(&command.user_id.as_str()) {
        return reply("You are not authorized to use this command.".to_string());
    }

    let result = match command.command.as_str() {
        "viewpendingprojects" => view_pending(&state).await,
        "approveproject" => approve(&state, &command).await,
        "rejectproject" => reject(&state, &command).await,
        "banuser" => ban(&state, &command).await,
        "unbanuser" => unban(&state, &command).await,
        other => Ok(format!("Unknown command: {}", other)),
    };

    match result {
        Ok(content) => reply(content),
        Err(err) => {
            tracing::error!("Error handling admin command: {}", err);
            reply("An error occurred while processing your command.".to_string())
        }
    }
}

fn option<'a>(command: &'a BotCommand, name: &str) -> Option<&'a str> {
    command
        .options
        .get(name)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
}

async fn view_pending(state: &AppState) -> Result<String, AppError> {
    let pending = state.repo.pending_projects().await?;
    if pending.is_empty() {
        return Ok("No pending projects found.".to_string());
    }

    let listing = pending
        .iter()
        .map(|p| format!("{} (ID: {}) - Team: {}", p.name, p.id, p.team_id))
        .collect::<Vec<_>>()
        .join("\n");
    Ok(format!("**Pending Projects:**\n{}", listing))
}

async fn approve(state: &AppState, command: &BotCommand) -> Result<String, AppError> {
    let Some(project_id) = option(command, "project_id") else {
        return Ok("project_id is required.".to_string());
    };

    match state
        .repo
        .set_project_status(project_id, ProjectStatus::Approved, None)
        .await?
    {
        Some(project) => Ok(format!("Project {} has been approved.", project.name)),
        None => Ok(format!("Project with ID {} not found.", project_id)),
    }
}

async fn reject(state: &AppState, command: &BotCommand) -> Result<String, AppError> {
    let Some(project_id) = option(command, "project_id") else {
        return Ok("project_id is required.".to_string());
    };
    let Some(reason) = option(command, "reason") else {
        return Ok("reason is required.".to_string());
    };

    match state
        .repo
        .set_project_status(project_id, ProjectStatus::Rejected, Some(reason))
        .await?
    {
        Some(_) => Ok(format!(
            "Project {} has been rejected for the following reason: {}",
            project_id, reason
        )),
        None => Ok(format!("Project with ID {} not found.", project_id)),
    }
}

async fn ban(state: &AppState, command: &BotCommand) -> Result<String, AppError> {
    let Some(user_id) = option(command, "user_id") else {
        return Ok("user_id is required.".to_string());
    };
    let Some(reason) = option(command, "reason") else {
        return Ok("reason is required.".to_string());
    };
    if !BAN_REASONS.contains(&reason) {
        return Ok(format!(
            "Invalid reason. Accepted reasons: {}",
            BAN_REASONS.join(", ")
        ));
    }

    match state.repo.set_ban(user_id, true, reason).await? {
        Some(member) => Ok(format!(
            "User {} has been banned for: {}",
            member.slack_name, reason
        )),
        None => Ok(format!("User with ID {} not found.", user_id)),
    }
}

async fn unban(state: &AppState, command: &BotCommand) -> Result<String, AppError> {
    let Some(user_id) = option(command, "user_id") else {
        return Ok("user_id is required.".to_string());
    };

    match state.repo.set_ban(user_id, false, "Unbanned").await? {
        Some(member) => Ok(format!("User {} has been unbanned.", member.slack_name)),
        None => Ok(format!("User with ID {} not found.", user_id)),
    }
}
