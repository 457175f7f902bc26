//! Configuration module for the Lodge backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Database ids for the collections the portal reads and writes.
#[derive(Debug, Clone)]
pub struct DatabaseIds {
    pub members: String,
    pub teams: String,
    pub projects: String,
    pub store_items: String,
    pub events: String,
    pub news: String,
    pub settings: String,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Public base URL used for OAuth redirects back into the frontend
    pub public_base_url: String,
    /// Base URL of the document-store API
    pub docstore_base_url: String,
    /// Bearer token for the document-store API
    pub docstore_api_key: String,
    /// Collection ids within the document store
    pub databases: DatabaseIds,
    /// Base URL of the Hackatime stats API
    pub hackatime_base_url: String,
    /// Slack OAuth application settings
    pub slack_client_id: String,
    pub slack_client_secret: String,
    pub slack_redirect_uri: String,
    /// Base URL of the Slack Web API (overridable for tests)
    pub slack_api_base: String,
    /// URL of the static JSON resource listing admin Slack ids
    pub admin_config_url: String,
    /// Path to the signup allow-list JSON file
    pub allowlist_path: PathBuf,
    /// Demo invite code and the identity it logs in as
    pub invite_code: Option<String>,
    pub demo_slack_id: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let bind_addr = env::var("LODGE_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .expect("Invalid LODGE_BIND_ADDR format");

        let log_level = env::var("LODGE_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let public_base_url = env::var("LODGE_PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        let docstore_base_url = env::var("LODGE_DOCSTORE_BASE_URL")
            .unwrap_or_else(|_| "https://api.notion.com".to_string());
        let docstore_api_key = env::var("LODGE_DOCSTORE_API_KEY").unwrap_or_default();

        let databases = DatabaseIds {
            members: env::var("LODGE_MEMBERS_DB_ID").unwrap_or_default(),
            teams: env::var("LODGE_TEAMS_DB_ID").unwrap_or_default(),
            projects: env::var("LODGE_PROJECTS_DB_ID").unwrap_or_default(),
            store_items: env::var("LODGE_STORE_ITEMS_DB_ID").unwrap_or_default(),
            events: env::var("LODGE_EVENTS_DB_ID").unwrap_or_default(),
            news: env::var("LODGE_NEWS_DB_ID").unwrap_or_default(),
            settings: env::var("LODGE_SETTINGS_DB_ID").unwrap_or_default(),
        };

        let hackatime_base_url = env::var("LODGE_HACKATIME_BASE_URL")
            .unwrap_or_else(|_| "https://hackatime.hackclub.com".to_string());

        let slack_client_id = env::var("LODGE_SLACK_CLIENT_ID").unwrap_or_default();
        let slack_client_secret = env::var("LODGE_SLACK_CLIENT_SECRET").unwrap_or_default();
        let slack_redirect_uri = env::var("LODGE_SLACK_REDIRECT_URI").unwrap_or_default();
        let slack_api_base = env::var("LODGE_SLACK_API_BASE")
            .unwrap_or_else(|_| "https://slack.com".to_string());

        let admin_config_url = env::var("LODGE_ADMIN_CONFIG_URL")
            .unwrap_or_else(|_| format!("{}/data.json", public_base_url));

        let allowlist_path = env::var("LODGE_ALLOWLIST_PATH")
            .unwrap_or_else(|_| "./allowed-members.json".to_string())
            .into();

        let invite_code = env::var("LODGE_INVITE_CODE").ok();
        let demo_slack_id =
            env::var("LODGE_DEMO_SLACK_ID").unwrap_or_else(|_| "U000000001".to_string());

        Self {
            bind_addr,
            log_level,
            public_base_url,
            docstore_base_url,
            docstore_api_key,
            databases,
            hackatime_base_url,
            slack_client_id,
            slack_client_secret,
            slack_redirect_uri,
            slack_api_base,
            admin_config_url,
            allowlist_path,
            invite_code,
            demo_slack_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        // Clear any existing env vars
        env::remove_var("LODGE_BIND_ADDR");
        env::remove_var("LODGE_LOG_LEVEL");
        env::remove_var("LODGE_PUBLIC_BASE_URL");
        env::remove_var("LODGE_DOCSTORE_BASE_URL");
        env::remove_var("LODGE_ADMIN_CONFIG_URL");
        env::remove_var("LODGE_ALLOWLIST_PATH");

        let config = Config::from_env();

        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.admin_config_url, "http://localhost:3000/data.json");
        assert_eq!(
            config.allowlist_path,
            PathBuf::from("./allowed-members.json")
        );
    }
}
