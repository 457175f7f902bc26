//! In-memory datastore backing the test suite.

use std::cmp::Ordering;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use super::props::{extract, Direction, Filter, Page, Properties, Scalar, Sort};
use super::Datastore;
use crate::errors::AppError;

struct Entry {
    database_id: String,
    page: Page,
}

/// Keeps pages in insertion order so unsorted queries are deterministic.
pub struct MemoryDatastore {
    entries: Mutex<Vec<Entry>>,
}

impl MemoryDatastore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Seed a page directly, returning its id.
    pub fn insert(&self, database_id: &str, properties: Properties) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        self.entries.lock().unwrap().push(Entry {
            database_id: database_id.to_string(),
            page: Page {
                id: id.clone(),
                created_time: now.clone(),
                last_edited_time: now,
                properties,
            },
        });
        id
    }

    /// Snapshot a page for assertions.
    pub fn page(&self, page_id: &str) -> Option<Page> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.page.id == page_id)
            .map(|e| e.page.clone())
    }

    pub fn contains(&self, page_id: &str) -> bool {
        self.page(page_id).is_some()
    }
}

fn compare_scalars(a: &Scalar, b: &Scalar) -> Ordering {
    match (a, b) {
        (Scalar::Number(x), Scalar::Number(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        _ => a.clone().into_text().cmp(&b.clone().into_text()),
    }
}

fn compare_pages(a: &Page, b: &Page, sorts: &[Sort]) -> Ordering {
    for sort in sorts {
        let left = extract(a.prop(&sort.property));
        let right = extract(b.prop(&sort.property));
        let ordering = match sort.direction {
            Direction::Ascending => compare_scalars(&left, &right),
            Direction::Descending => compare_scalars(&right, &left),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

#[async_trait]
impl Datastore for MemoryDatastore {
    async fn query(
        &self,
        database_id: &str,
        filter: Option<Filter>,
        sorts: &[Sort],
    ) -> Result<Vec<Page>, AppError> {
        let entries = self.entries.lock().unwrap();
        let mut pages: Vec<Page> = entries
            .iter()
            .filter(|e| e.database_id == database_id)
            .filter(|e| filter.as_ref().map(|f| f.matches(&e.page)).unwrap_or(true))
            .map(|e| e.page.clone())
            .collect();
        if !sorts.is_empty() {
            pages.sort_by(|a, b| compare_pages(a, b, sorts));
        }
        Ok(pages)
    }

    async fn retrieve(&self, page_id: &str) -> Result<Page, AppError> {
        self.page(page_id)
            .ok_or_else(|| AppError::NotFound(format!("Page {} not found", page_id)))
    }

    async fn create(&self, database_id: &str, properties: Properties) -> Result<Page, AppError> {
        let id = self.insert(database_id, properties);
        self.retrieve(&id).await
    }

    async fn update(&self, page_id: &str, properties: Properties) -> Result<Page, AppError> {
        let mut entries = self.entries.lock().unwrap();
        let entry = entries
            .iter_mut()
            .find(|e| e.page.id == page_id)
            .ok_or_else(|| AppError::NotFound(format!("Page {} not found", page_id)))?;
        for (name, value) in properties {
            entry.page.properties.insert(name, value);
        }
        entry.page.last_edited_time = Utc::now().to_rfc3339();
        Ok(entry.page.clone())
    }

    async fn delete(&self, page_id: &str) -> Result<(), AppError> {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|e| e.page.id != page_id);
        if entries.len() == before {
            return Err(AppError::NotFound(format!("Page {} not found", page_id)));
        }
        Ok(())
    }
}
