//! Slack slash-command dispatch.
//!
//! Participant commands look the caller up by Slack id with a display-name
//! fallback and refuse banned members; admin commands consult the fetched
//! admin-id list. All replies are ephemeral text.

use axum::{extract::State, Form, Json};
use serde::{Deserialize, Serialize};

use crate::auth;
use crate::errors::AppError;
use crate::models::{Member, ProjectStatus};
use crate::AppState;

/// Slash-command payload as Slack posts it.
#[derive(Debug, Clone, Deserialize)]
pub struct SlashCommand {
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct SlashResponse {
    pub response_type: &'static str,
    pub text: String,
}

fn reply(text: String) -> Json<SlashResponse> {
    Json(SlashResponse {
        response_type: "ephemeral",
        text,
    })
}

const NOT_REGISTERED: &str =
    "You haven't checked into the Lodge yet! Head to the portal to begin.";

/// POST /slack/commands - Dispatch one slash command.
pub async fn dispatch(
    State(state): State<AppState>,
    Form(payload): Form<SlashCommand>,
) -> Json<SlashResponse> {
    let command = payload.command.clone();
    let result = match command.as_str() {
        "/experience" => experience(&state, &payload).await,
        "/user" => user_profile(&state, &payload).await,
        "/projects" => team_projects(&state, &payload).await,
        "/team" => team_info(&state, &payload).await,
        "/mc-stats" => stats(&state).await,
        "/mc-help" => Ok(help_text()),
        "/mc-ping" => Ok("Pong! The Lodge bot is awake. :zap:".to_string()),
        "/adm-mc-ban" => admin_ban(&state, &payload).await,
        "/adm-mc-unban" => admin_unban(&state, &payload).await,
        "/adm-mc-approveproject" => admin_approve(&state, &payload).await,
        "/adm-mc-rejectproject" => admin_reject(&state, &payload).await,
        "/adm-mc-viewpendingprojects" => admin_pending(&state, &payload).await,
        _ => Ok(format!("Unknown command {}. Try /mc-help.", command)),
    };

    match result {
        Ok(text) => reply(text),
        Err(err) => {
            tracing::error!("Error in {} command: {}", command, err);
            reply("Sorry, there was an error processing your command.".to_string())
        }
    }
}

/// Look a caller up by Slack id, falling back to the display name.
async fn lookup_caller(
    state: &AppState,
    payload: &SlashCommand,
) -> Result<Option<Member>, AppError> {
    if let Some(member) = state.repo.find_member_by_slack_id(&payload.user_id).await? {
        return Ok(Some(member));
    }
    state.repo.find_member_by_slack_name(&payload.user_name).await
}

fn ban_notice(member: &Member) -> Option<String> {
    if !member.banned {
        return None;
    }
    let reason = if member.ban_reason.is_empty() {
        "No reason given".to_string()
    } else {
        member.ban_reason.clone()
    };
    Some(format!(
        "You are banned from the Lodge and cannot use this command. Reason: {}",
        reason
    ))
}

async fn experience(state: &AppState, payload: &SlashCommand) -> Result<String, AppError> {
    let Some(user) = lookup_caller(state, payload).await? else {
        return Ok(NOT_REGISTERED.to_string());
    };
    if let Some(notice) = ban_notice(&user) {
        return Ok(notice);
    }

    if user.xp == 0 {
        return Ok(":coin: You still haven't earned any experience points!".to_string());
    }
    let level = user.xp / 1000;
    Ok(format!(
        ":coin: You have {} experience points! This means you are level {}. Keep up the great work! :tada:",
        user.xp, level
    ))
}

async fn user_profile(state: &AppState, payload: &SlashCommand) -> Result<String, AppError> {
    let Some(user) = lookup_caller(state, payload).await? else {
        return Ok(NOT_REGISTERED.to_string());
    };
    if let Some(notice) = ban_notice(&user) {
        return Ok(notice);
    }

    let team_info = if user.team_id.is_empty() {
        "Not assigned".to_string()
    } else {
        let teammates = state.repo.members_for_team(&user.team_id).await?;
        let team_name = state.repo.team_name_or(&user.team_id, "").await;
        let name = if team_name.is_empty() {
            format!("Team {}", user.team_id)
        } else {
            team_name
        };
        format!("{} ({} members)", name, teammates.len())
    };

    Ok(format!(
        "*Your Lodge Profile*\n\n:bust_in_silhouette: *Slack Name:* {}\n:coin: *Experience:* {} XP\n:handshake: *Team:* {}",
        user.slack_name, user.xp, team_info
    ))
}

async fn team_projects(state: &AppState, payload: &SlashCommand) -> Result<String, AppError> {
    let Some(user) = lookup_caller(state, payload).await? else {
        return Ok(NOT_REGISTERED.to_string());
    };
    if let Some(notice) = ban_notice(&user) {
        return Ok(notice);
    }

    let projects = state.repo.projects_for_team(&user.team_id).await?;
    if projects.is_empty() {
        return Ok("You haven't created any projects yet... why not do that?".to_string());
    }

    let listing = projects
        .iter()
        .map(|p| {
            let mut lines = format!(
                "• *{}*\n  Status: {}\n  Hours: {}",
                p.name,
                p.status.as_str(),
                p.hackatime_hours
            );
            if !p.description.is_empty() {
                lines.push_str(&format!("\n  Description: {}", p.description));
            }
            if !p.git_repo.is_empty() {
                lines.push_str(&format!("\n  Repo: {}", p.git_repo));
            }
            lines
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    let team_name = state.repo.team_name_or(&user.team_id, &user.team_id).await;
    Ok(format!(
        "*Your Lodge Projects (Team {})*\n\n{}",
        team_name, listing
    ))
}

async fn team_info(state: &AppState, payload: &SlashCommand) -> Result<String, AppError> {
    let Some(user) = lookup_caller(state, payload).await? else {
        return Ok(NOT_REGISTERED.to_string());
    };
    if let Some(notice) = ban_notice(&user) {
        return Ok(notice);
    }

    if user.team_id.is_empty() {
        return Ok(
            "You haven't joined a team yet! Why not create or join one? You can be the only member if you want..."
                .to_string(),
        );
    }

    let team = state.repo.find_team_by_team_id(&user.team_id).await?;
    let teammates = state.repo.members_for_team(&user.team_id).await?;
    let projects = state.repo.projects_for_team(&user.team_id).await?;

    let header = match &team {
        Some(team) if !team.name.trim().is_empty() => {
            format!("*Team:* {}\n*Size:* {}\n\n", team.name, team.team_size)
        }
        Some(team) => format!("*Team:* Team {}\n*Size:* {}\n\n", user.team_id, team.team_size),
        None => format!("*Team:* Team {}\n\n", user.team_id),
    };

    let members_list = teammates
        .iter()
        .map(|m| format!("• {} - {} XP", m.slack_name, m.xp))
        .collect::<Vec<_>>()
        .join("\n");

    let projects_list = projects
        .iter()
        .map(|p| format!("• {} - {}", p.name, p.status.as_str()))
        .collect::<Vec<_>>()
        .join("\n");

    Ok(format!(
        "*Your Lodge Team*\n\n{}*Members:*\n{}\n\n*Projects:*\n{}",
        header,
        if members_list.is_empty() {
            "No members found"
        } else {
            &members_list
        },
        if projects_list.is_empty() {
            "No projects found"
        } else {
            &projects_list
        }
    ))
}

const USER_GOAL: usize = 200;

async fn stats(state: &AppState) -> Result<String, AppError> {
    let (total_users, total_projects) = state.repo.totals().await?;

    let goal_message = if total_users >= USER_GOAL {
        "User goal reached! Amazing work everyone! :partying_face:".to_string()
    } else {
        format!(
            "{} to go towards our goal of {} users! :rocket:",
            USER_GOAL - total_users,
            USER_GOAL
        )
    };

    Ok(format!(
        "*Lodge Statistics*\n\n:busts_in_silhouette: *Total Users:* {}\n:wrench: *Total Projects:* {}\n\n{}",
        total_users, total_projects, goal_message
    ))
}

fn help_text() -> String {
    [
        "*Lodge Bot Help*",
        "",
        "*Available Commands:*",
        "",
        "• `/experience` - Shows your experience points and level",
        "• `/user` - Shows info about you",
        "• `/projects` - Shows your projects",
        "• `/team` - Shows info about your team",
        "• `/mc-stats` - Shows total users and projects",
        "• `/mc-ping` - Checks the bot is alive",
        "• `/mc-help` - Shows this help message :D",
    ]
    .join("\n")
}

async fn require_admin(state: &AppState, payload: &SlashCommand) -> Result<bool, AppError> {
    Ok(auth::is_admin(&state.http, &state.config.admin_config_url, &payload.user_id).await)
}

const NOT_AUTHORIZED: &str = "You are not authorized to use this command.";

async fn admin_ban(state: &AppState, payload: &SlashCommand) -> Result<String, AppError> {
    if !require_admin(state, payload).await? {
        return Ok(NOT_AUTHORIZED.to_string());
    }

    let mut args = payload.text.split_whitespace();
    let Some(user_id) = args.next() else {
        return Ok("Usage: /adm-mc-ban <user_id> <reason>".to_string());
    };
    let reason = args.collect::<Vec<_>>().join(" ");
    if reason.is_empty() {
        return Ok("Usage: /adm-mc-ban <user_id> <reason>".to_string());
    }

    match state.repo.set_ban(user_id, true, &reason).await? {
        Some(member) => Ok(format!(
            "User {} has been banned for: {}",
            member.slack_name, reason
        )),
        None => Ok(format!("User with ID {} not found.", user_id)),
    }
}

async fn admin_unban(state: &AppState, payload: &SlashCommand) -> Result<String, AppError> {
    if !require_admin(state, payload).await? {
        return Ok(NOT_AUTHORIZED.to_string());
    }

    let user_id = payload.text.trim();
    if user_id.is_empty() {
        return Ok("Usage: /adm-mc-unban <user_id>".to_string());
    }

    match state.repo.set_ban(user_id, false, "Unbanned").await? {
        Some(member) => Ok(format!("User {} has been unbanned.", member.slack_name)),
        None => Ok(format!("User with ID {} not found.", user_id)),
    }
}

async fn admin_approve(state: &AppState, payload: &SlashCommand) -> Result<String, AppError> {
    if !require_admin(state, payload).await? {
        return Ok(NOT_AUTHORIZED.to_string());
    }

    let project_id = payload.text.trim();
    if project_id.is_empty() {
        return Ok("Usage: /adm-mc-approveproject <project_id>".to_string());
    }

    match state
        .repo
        .set_project_status(project_id, ProjectStatus::Approved, None)
        .await?
    {
        Some(project) => Ok(format!("Project {} has been approved.", project.name)),
        None => Ok(format!("Project with ID {} not found.", project_id)),
    }
}

async fn admin_reject(state: &AppState, payload: &SlashCommand) -> Result<String, AppError> {
    if !require_admin(state, payload).await? {
        return Ok(NOT_AUTHORIZED.to_string());
    }

    let mut args = payload.text.split_whitespace();
    let Some(project_id) = args.next() else {
        return Ok("Usage: /adm-mc-rejectproject <project_id> <reason>".to_string());
    };
    let reason = args.collect::<Vec<_>>().join(" ");
    if reason.is_empty() {
        return Ok("Usage: /adm-mc-rejectproject <project_id> <reason>".to_string());
    }

    match state
        .repo
        .set_project_status(project_id, ProjectStatus::Rejected, Some(&reason))
        .await?
    {
        Some(_) => Ok(format!(
            "Project {} has been rejected for the following reason: {}",
            project_id, reason
        )),
        None => Ok(format!("Project with ID {} not found.", project_id)),
    }
}

async fn admin_pending(state: &AppState, payload: &SlashCommand) -> Result<String, AppError> {
    if !require_admin(state, payload).await? {
        return Ok(NOT_AUTHORIZED.to_string());
    }

    let pending = state.repo.pending_projects().await?;
    if pending.is_empty() {
        return Ok("No pending projects found.".to_string());
    }

    let listing = pending
        .iter()
        .map(|p| format!("{} (ID: {}) - Team: {}", p.name, p.id, p.team_id))
        .collect::<Vec<_>>()
        .join("\n");
    Ok(format!("*Pending Projects:*\n{}", listing))
}
