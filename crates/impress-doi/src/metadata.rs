//! Best-effort title lookup via Crossref
//!
//! API docs: https://api.crossref.org/swagger-ui/index.html
//!
//! The lookup only feeds a cosmetic title. Callers build links before it runs
//! and fall back to a placeholder when it fails.

use serde::Deserialize;
use thiserror::Error;

#[cfg(feature = "native")]
use crate::config::MetadataConfig;
use crate::identifier::Identifier;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    #[error("Request failed: {message}")]
    RequestFailed { message: String },

    #[error("Unexpected HTTP status {status}")]
    Status { status: u16 },

    #[error("Rate limited")]
    RateLimited,

    #[error("Parse error: {message}")]
    Parse { message: String },

    #[error("Work has no title")]
    MissingTitle,

    #[error("No metadata lookup for {identifier}")]
    Unsupported { identifier: String },
}

#[derive(Debug, Deserialize)]
struct CrossrefResponse {
    message: CrossrefWork,
}

#[derive(Debug, Deserialize)]
struct CrossrefWork {
    title: Option<Vec<String>>,
}

/// First title of a Crossref `/works/{doi}` response
pub fn parse_crossref_title(json: &str) -> Result<String, MetadataError> {
    let response: CrossrefResponse =
        serde_json::from_str(json).map_err(|e| MetadataError::Parse {
            message: format!("Invalid Crossref JSON: {}", e),
        })?;

    response
        .message
        .title
        .unwrap_or_default()
        .into_iter()
        .map(|title| title.split_whitespace().collect::<Vec<_>>().join(" "))
        .find(|title| !title.is_empty())
        .ok_or(MetadataError::MissingTitle)
}

/// Crossref `/works/{doi}` URL under `endpoint`
pub fn crossref_work_url(endpoint: &str, identifier: &Identifier) -> String {
    format!("{}{}", endpoint, identifier.path_escaped())
}

/// Collapse a lookup result into something displayable
pub fn title_or_placeholder(result: Result<String, MetadataError>, placeholder: &str) -> String {
    match result {
        Ok(title) => title,
        Err(e) => {
            tracing::warn!(error = %e, "Metadata fetch failed");
            placeholder.to_string()
        }
    }
}

/// Crossref client over reqwest
#[cfg(feature = "native")]
pub struct CrossrefClient {
    client: reqwest::Client,
    endpoint: String,
}

#[cfg(feature = "native")]
impl CrossrefClient {
    pub fn new(config: &MetadataConfig) -> Result<Self, MetadataError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| MetadataError::RequestFailed {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    /// Fetch the title for a DOI. arXiv ids are not registered with Crossref.
    pub async fn fetch_title(&self, identifier: &Identifier) -> Result<String, MetadataError> {
        if identifier.is_arxiv() {
            return Err(MetadataError::Unsupported {
                identifier: identifier.to_string(),
            });
        }

        let url = crossref_work_url(&self.endpoint, identifier);
        tracing::debug!(%url, "Fetching title");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MetadataError::RequestFailed {
                message: e.to_string(),
            })?;

        let status = response.status().as_u16();
        if status == 429 {
            return Err(MetadataError::RateLimited);
        }
        if !response.status().is_success() {
            return Err(MetadataError::Status { status });
        }

        let body = response.text().await.map_err(|e| MetadataError::Parse {
            message: e.to_string(),
        })?;

        parse_crossref_title(&body)
    }
}
