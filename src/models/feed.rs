//! Read-only feed models: events, news and global settings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A scheduled hackathon event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub name: String,
    pub location: String,
    pub description: String,
    pub day_of_week: String,
    pub hour: String,
    pub is_main_event: bool,
    pub is_store_unlockable: bool,
    pub has_limited_attendees: bool,
    pub xp_to_buy: Option<String>,
    pub max_attendees: Option<i64>,
    pub store_item_id: Option<String>,
    pub created_time: String,
    pub last_edited_time: String,
}

/// A news post shown on the portal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsPost {
    pub id: String,
    pub name: String,
    pub description: String,
    pub md_content: String,
    pub author: String,
    pub publication_date: Option<String>,
    pub created_time: String,
    pub last_edited_time: String,
}

/// A feature-flag value: `"true"`/`"false"` strings fold to booleans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Flag(bool),
    Text(String),
}

/// Global settings map, served fresh on every request.
pub type Settings = BTreeMap<String, SettingValue>;
