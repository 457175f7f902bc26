//! Project, devlog and Hackatime-link models.

use serde::{Deserialize, Serialize};

/// Project lifecycle state.
///
/// Created → In development happens automatically on the first devlog or
/// Hackatime link; the later transitions are written by the admin surfaces
/// with no prior-state validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectStatus {
    Created,
    #[serde(rename = "In development")]
    InDevelopment,
    Submitted,
    Approved,
    Rejected,
}

impl ProjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Created => "Created",
            ProjectStatus::InDevelopment => "In development",
            ProjectStatus::Submitted => "Submitted",
            ProjectStatus::Approved => "Approved",
            ProjectStatus::Rejected => "Rejected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Created" => Some(ProjectStatus::Created),
            "In development" => Some(ProjectStatus::InDevelopment),
            "Submitted" => Some(ProjectStatus::Submitted),
            "Approved" => Some(ProjectStatus::Approved),
            "Rejected" => Some(ProjectStatus::Rejected),
            _ => None,
        }
    }
}

/// A free-text progress update attached to a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Devlog {
    pub id: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub timestamp: String,
    /// Author display name, denormalized at write time
    pub author: String,
}

/// A Hackatime project linked by one contributor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedHackatimeProject {
    pub project_name: String,
    pub user_id: String,
    pub user_name: String,
    pub user_slack_name: String,
}

/// A Hackatime link, stored either as a bare project name (legacy records)
/// or as a full object. Converted once at the parse boundary; all business
/// logic goes through the accessors below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HackatimeLink {
    Linked(LinkedHackatimeProject),
    Legacy(String),
}

impl HackatimeLink {
    pub fn project_name(&self) -> &str {
        match self {
            HackatimeLink::Linked(link) => &link.project_name,
            HackatimeLink::Legacy(name) => name,
        }
    }

    /// Whether this link is the one addressed by a (name, user) pair.
    /// Legacy links carry no user and match on the name alone.
    pub fn matches(&self, project_name: &str, user_id: &str) -> bool {
        match self {
            HackatimeLink::Linked(link) => {
                link.project_name == project_name && link.user_id == user_id
            }
            HackatimeLink::Legacy(name) => name.as_str() == project_name,
        }
    }
}

/// A project backed by a page in the projects database.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Document-store page id, needed for updates
    #[serde(skip)]
    pub record_id: String,
    /// Generated project id, distinct from the page id
    pub id: String,
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
    pub team_id: String,
    pub team_name: String,
    pub git_repo: String,
    pub date_submitted: String,
    pub hackatime_hours: f64,
    pub rejection_reason: String,
    pub devlogs: Vec<Devlog>,
    pub hackatime_projects: Vec<HackatimeLink>,
}

/// Condensed project row for listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: String,
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
    pub team_id: String,
    pub team_name: String,
    pub members: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Request body for creating a project.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    #[serde(default)]
    pub project_name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Request body for a partial project update.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub git_repo: Option<String>,
}

/// Request body for appending a devlog.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddDevlogRequest {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Request body for linking a Hackatime project.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkHackatimeRequest {
    #[serde(default)]
    pub project_name: String,
}

/// Request body for unlinking a Hackatime project.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlinkHackatimeRequest {
    #[serde(default)]
    pub project_name: String,
    /// Defaults to the caller when absent
    #[serde(default)]
    pub user_id: Option<String>,
}
