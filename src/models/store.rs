//! Store catalog models.

use serde::{Deserialize, Serialize};

/// Stock state of a catalog item. Purchases require exactly `InStock`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockStatus {
    #[serde(rename = "In stock")]
    InStock,
    #[serde(rename = "No stock")]
    NoStock,
    #[serde(rename = "Will be restocked")]
    WillBeRestocked,
}

impl StockStatus {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "In stock" => Some(StockStatus::InStock),
            "No stock" => Some(StockStatus::NoStock),
            "Will be restocked" => Some(StockStatus::WillBeRestocked),
            _ => None,
        }
    }
}

/// Event details denormalized onto a store item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedEvent {
    pub id: String,
    pub name: String,
    pub day_of_week: String,
    pub hour: String,
}

/// A purchasable catalog item. Read-only from the portal's perspective.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreItem {
    pub id: String,
    pub name: String,
    pub description: String,
    pub xp_price: i64,
    pub stock_status: StockStatus,
    pub category: String,
    /// 0 means unlimited
    pub limit_per_person: i64,
    pub related_event: Option<RelatedEvent>,
    pub created_time: String,
    pub last_edited_time: String,
}

/// Request body for a purchase.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    #[serde(default)]
    pub item_id: String,
}

/// Request body for toggling a purchase's used flag.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleUsageRequest {
    #[serde(default)]
    pub purchase_index: Option<i64>,
    #[serde(default)]
    pub mark_as_used: Option<bool>,
}
