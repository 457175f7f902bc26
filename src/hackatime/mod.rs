//! Client for the external Hackatime time-tracking API.
//!
//! Failures degrade to `None` so hour aggregation treats an unreachable
//! contributor as zero tracked time.

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HackatimeStats {
    #[serde(default)]
    pub data: HackatimeData,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HackatimeData {
    #[serde(default)]
    pub projects: Vec<HackatimeProject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HackatimeProject {
    pub name: String,
    #[serde(default)]
    pub total_seconds: f64,
}

impl HackatimeStats {
    /// Tracked hours for one named project, 0 when absent.
    pub fn project_hours(&self, project_name: &str) -> f64 {
        self.data
            .projects
            .iter()
            .find(|p| p.name == project_name)
            .map(|p| p.total_seconds / 3600.0)
            .unwrap_or(0.0)
    }
}

pub struct HackatimeClient {
    base_url: String,
    http: reqwest::Client,
}

impl HackatimeClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    /// Fetch a user's per-project statistics. Any failure is logged and
    /// reported as `None`.
    pub async fn stats(&self, user_id: &str) -> Option<HackatimeStats> {
        let url = format!(
            "{}/api/v1/users/{}/stats?features=projects",
            self.base_url, user_id
        );

        let response = match self.http.get(&url).send().await {
            Ok(response) => response,
            Err(err) => {
                tracing::error!("Error fetching Hackatime stats for {}: {}", user_id, err);
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::error!(
                "Failed to fetch Hackatime stats for {}: {}",
                user_id,
                response.status()
            );
            return None;
        }

        match response.json().await {
            Ok(stats) => Some(stats),
            Err(err) => {
                tracing::error!("Error parsing Hackatime stats for {}: {}", user_id, err);
                None
            }
        }
    }
}
