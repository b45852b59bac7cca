//! CMS content query client
//!
//! Fetches the complete current set of documents of one kind, used by the
//! reconciliation scanner.

use async_trait::async_trait;
use cmsync_common::config::CmsConfig;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::models::EntityKind;

const USER_AGENT: &str = concat!("cmsync/", env!("CARGO_PKG_VERSION"));

/// CMS client errors
#[derive(Debug, Error)]
pub enum CmsError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// Source of truth for mirrored content
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Every current document of `kind`, as raw CMS payloads
    async fn fetch_all(&self, kind: EntityKind) -> Result<Vec<Value>, CmsError>;
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    result: Option<Vec<Value>>,
}

/// Sanity HTTP query API client
pub struct SanityContentClient {
    http_client: reqwest::Client,
    query_url: String,
    token: Option<String>,
}

impl SanityContentClient {
    pub fn new(config: &CmsConfig) -> Result<Self, CmsError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CmsError::NetworkError(e.to_string()))?;

        let host = if config.use_cdn { "apicdn" } else { "api" };
        let query_url = format!(
            "https://{}.{}.sanity.io/v{}/data/query/{}",
            config.project_id, host, config.api_version, config.dataset
        );

        Ok(Self {
            http_client,
            query_url,
            token: config.token.clone(),
        })
    }

    pub fn query_url(&self) -> &str {
        &self.query_url
    }

    /// GROQ query selecting every document of one kind
    pub fn query_for(kind: EntityKind) -> String {
        format!("*[_type == \"{}\"]", kind.type_tag())
    }
}

#[async_trait]
impl ContentSource for SanityContentClient {
    async fn fetch_all(&self, kind: EntityKind) -> Result<Vec<Value>, CmsError> {
        let query = Self::query_for(kind);
        tracing::debug!(%kind, url = %self.query_url, query = %query, "Querying CMS");

        let mut request = self
            .http_client
            .get(&self.query_url)
            .query(&[("query", query.as_str())]);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| CmsError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(CmsError::ApiError(status.as_u16(), error_text));
        }

        let body: QueryResponse = response
            .json()
            .await
            .map_err(|e| CmsError::ParseError(e.to_string()))?;

        let documents = body.result.unwrap_or_default();
        tracing::info!(%kind, count = documents.len(), "Fetched documents from CMS");
        Ok(documents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_url_uses_live_api_by_default() {
        let client = SanityContentClient::new(&CmsConfig::default()).unwrap();
        assert_eq!(
            client.query_url(),
            "https://9cb050q1.api.sanity.io/v2022-11-29/data/query/production"
        );
    }

    #[test]
    fn test_query_url_cdn() {
        let config = CmsConfig {
            use_cdn: true,
            ..CmsConfig::default()
        };
        let client = SanityContentClient::new(&config).unwrap();
        assert!(client.query_url().starts_with("https://9cb050q1.apicdn.sanity.io/"));
    }

    #[test]
    fn test_query_per_kind() {
        assert_eq!(
            SanityContentClient::query_for(EntityKind::Translation),
            r#"*[_type == "translation"]"#
        );
    }
}
