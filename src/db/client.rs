//! HTTP client for the document-store API.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::props::{Filter, Page, Properties, Sort};
use super::Datastore;
use crate::errors::AppError;

/// Client for the live document-store service.
pub struct HttpDatastore {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<Page>,
}

impl HttpDatastore {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check(&self, response: reqwest::Response) -> Result<reqwest::Response, AppError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::error!("Document store returned {}: {}", status, body);
        Err(AppError::Upstream(format!(
            "Document store returned {}",
            status
        )))
    }
}

#[async_trait]
impl Datastore for HttpDatastore {
    async fn query(
        &self,
        database_id: &str,
        filter: Option<Filter>,
        sorts: &[Sort],
    ) -> Result<Vec<Page>, AppError> {
        let mut body = json!({});
        if let Some(filter) = &filter {
            body["filter"] = filter.to_json();
        }
        if !sorts.is_empty() {
            body["sorts"] = json!(sorts.iter().map(Sort::to_json).collect::<Vec<_>>());
        }

        let response = self
            .http
            .post(self.url(&format!("/v1/databases/{}/query", database_id)))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let parsed: QueryResponse = self.check(response).await?.json().await?;
        Ok(parsed.results)
    }

    async fn retrieve(&self, page_id: &str) -> Result<Page, AppError> {
        let response = self
            .http
            .get(self.url(&format!("/v1/pages/{}", page_id)))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        Ok(self.check(response).await?.json().await?)
    }

    async fn create(&self, database_id: &str, properties: Properties) -> Result<Page, AppError> {
        let body = json!({
            "parent": { "database_id": database_id },
            "properties": properties,
        });

        let response = self
            .http
            .post(self.url("/v1/pages"))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        Ok(self.check(response).await?.json().await?)
    }

    async fn update(&self, page_id: &str, properties: Properties) -> Result<Page, AppError> {
        let body = json!({ "properties": properties });

        let response = self
            .http
            .patch(self.url(&format!("/v1/pages/{}", page_id)))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        Ok(self.check(response).await?.json().await?)
    }

    async fn delete(&self, page_id: &str) -> Result<(), AppError> {
        let response = self
            .http
            .delete(self.url(&format!("/v1/blocks/{}", page_id)))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        self.check(response).await?;
        Ok(())
    }
}
