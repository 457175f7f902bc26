//! Document-store access layer.
//!
//! The external document store is the source of truth for all application
//! data; this module defines the thin client seam over it plus the typed
//! repository the rest of the backend talks to.

mod client;
#[cfg(test)]
mod memory;
pub mod props;
mod repository;

pub use client::HttpDatastore;
#[cfg(test)]
pub use memory::MemoryDatastore;
pub use repository::*;

use async_trait::async_trait;

use crate::errors::AppError;
use props::{Filter, Page, Properties, Sort};

/// Raw page operations against the document store.
///
/// One implementation speaks HTTP to the live service; the test suite plugs
/// in an in-memory stand-in behind the same seam.
#[async_trait]
pub trait Datastore: Send + Sync {
    /// Query a database for pages, optionally filtered and sorted.
    async fn query(
        &self,
        database_id: &str,
        filter: Option<Filter>,
        sorts: &[Sort],
    ) -> Result<Vec<Page>, AppError>;

    /// Retrieve a single page by id.
    async fn retrieve(&self, page_id: &str) -> Result<Page, AppError>;

    /// Create a page in a database.
    async fn create(&self, database_id: &str, properties: Properties) -> Result<Page, AppError>;

    /// Update properties on an existing page. Unnamed properties are left
    /// untouched.
    async fn update(&self, page_id: &str, properties: Properties) -> Result<Page, AppError>;

    /// Delete a page outright.
    async fn delete(&self, page_id: &str) -> Result<(), AppError>;
}
