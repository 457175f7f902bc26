//! Project API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::auth::Session;
use crate::errors::AppError;
use crate::models::{
    AddDevlogRequest, CreateProjectRequest, Devlog, LinkHackatimeRequest, LinkedHackatimeProject,
    Member, Project, ProjectStatus, ProjectSummary, UnlinkHackatimeRequest, UpdateProjectRequest,
};
use crate::AppState;

use super::{require_user, AckResponse};

#[derive(Debug, Serialize)]
pub struct ProjectsResponse {
    pub projects: Vec<ProjectSummary>,
}

/// GET /api/projects - List all projects.
pub async fn list_projects(
    State(state): State<AppState>,
    _session: Session,
) -> Result<Json<ProjectsResponse>, AppError> {
    let projects = state.repo.list_projects().await?;
    Ok(Json(ProjectsResponse { projects }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedProject {
    pub id: String,
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
    pub team_id: String,
}

#[derive(Debug, Serialize)]
pub struct CreateProjectResponse {
    pub success: bool,
    pub project: CreatedProject,
}

/// POST /api/projects/create - Create a project for the caller's team.
pub async fn create_project(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<CreateProjectRequest>,
) -> Result<Json<CreateProjectResponse>, AppError> {
    if request.project_name.trim().is_empty() {
        return Err(AppError::Validation("Project name is required".to_string()));
    }

    let user = require_user(&state, &session).await?;
    let project = state
        .repo
        .create_project(&user, &request.project_name, request.description.as_deref())
        .await?;

    Ok(Json(CreateProjectResponse {
        success: true,
        project: CreatedProject {
            id: project.id,
            name: project.name,
            description: project.description,
            status: project.status,
            team_id: project.team_id,
        },
    }))
}

/// Fetch a project and check the caller's team against its owning team.
async fn authorized_project(
    state: &AppState,
    user: &Member,
    project_id: &str,
) -> Result<Project, AppError> {
    let project = state
        .repo
        .find_project_by_project_id(project_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Project not found".to_string()))?;

    if user.team_id != project.team_id {
        return Err(AppError::Forbidden("Access denied".to_string()));
    }

    Ok(project)
}

#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub project: Project,
}

/// GET /api/projects/{id} - Fetch one project with devlogs and links.
pub async fn get_project(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Json<ProjectResponse>, AppError> {
    let user = require_user(&state, &session).await?;
    let project = authorized_project(&state, &user, &id).await?;
    Ok(Json(ProjectResponse { project }))
}

/// PUT /api/projects/{id} - Partial update of description and git repo.
pub async fn update_project(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Json(request): Json<UpdateProjectRequest>,
) -> Result<Json<AckResponse>, AppError> {
    let user = require_user(&state, &session).await?;
    let project = authorized_project(&state, &user, &id).await?;

    state
        .repo
        .update_project(
            &project,
            request.description.as_deref(),
            request.git_repo.as_deref(),
        )
        .await?;

    Ok(Json(AckResponse { success: true }))
}

#[derive(Debug, Serialize)]
pub struct AddDevlogResponse {
    pub success: bool,
    pub devlog: Devlog,
}

/// POST /api/projects/{id}/devlogs - Append a devlog entry.
pub async fn add_devlog(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Json(request): Json<AddDevlogRequest>,
) -> Result<Json<AddDevlogResponse>, AppError> {
    if request.content.trim().is_empty() {
        return Err(AppError::Validation("Content is required".to_string()));
    }

    let user = require_user(&state, &session).await?;
    let project = authorized_project(&state, &user, &id).await?;

    let author = if user.name.is_empty() {
        "Unknown User".to_string()
    } else {
        user.name.clone()
    };
    let devlog = state
        .repo
        .add_devlog(
            &project,
            &author,
            &request.content,
            request.image_url.as_deref(),
        )
        .await?;

    Ok(Json(AddDevlogResponse {
        success: true,
        devlog,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkHackatimeResponse {
    pub success: bool,
    pub hackatime_project: LinkedHackatimeProject,
    pub updated_hours: f64,
}

/// POST /api/projects/{id}/hackatime - Link a Hackatime project.
pub async fn link_hackatime(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Json(request): Json<LinkHackatimeRequest>,
) -> Result<Json<LinkHackatimeResponse>, AppError> {
    if request.project_name.trim().is_empty() {
        return Err(AppError::Validation("Project name is required".to_string()));
    }

    let user = require_user(&state, &session).await?;
    let project = authorized_project(&state, &user, &id).await?;

    let (hackatime_project, updated_hours) = state
        .repo
        .link_hackatime(&state.hackatime, &project, &user, &request.project_name)
        .await?;

    Ok(Json(LinkHackatimeResponse {
        success: true,
        hackatime_project,
        updated_hours,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlinkHackatimeResponse {
    pub success: bool,
    pub updated_hours: f64,
}

/// DELETE /api/projects/{id}/hackatime - Unlink a Hackatime project.
pub async fn unlink_hackatime(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Json(request): Json<UnlinkHackatimeRequest>,
) -> Result<Json<UnlinkHackatimeResponse>, AppError> {
    if request.project_name.trim().is_empty() {
        return Err(AppError::Validation("Project name is required".to_string()));
    }

    let user = require_user(&state, &session).await?;
    let project = authorized_project(&state, &user, &id).await?;

    let updated_hours = state
        .repo
        .unlink_hackatime(
            &state.hackatime,
            &project,
            &user.slack_id,
            &request.project_name,
            request.user_id.as_deref(),
        )
        .await?;

    Ok(Json(UnlinkHackatimeResponse {
        success: true,
        updated_hours,
    }))
}
