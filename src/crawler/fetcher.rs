//! Target fetcher contract and HTTP adapter
//!
//! The fetcher turns a chunk of sources into a finite sequence of per-source
//! events plus a chunk-level quota flag. Paging, authentication and retries
//! live behind the fetch service; this module only speaks its contract.

use crate::crawler::{CrawlMode, CrawlSource};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors from a whole-chunk fetch call
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Fetch service returned HTTP {status}")]
    Status { status: u16 },

    #[error("External request quota exhausted")]
    RateLimited,
}

/// Outcome for one source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FetchEvent {
    Complete {
        source: String,
        targets: Vec<String>,
        /// Authoritative target total, when the API reports one
        #[serde(rename = "totalCount", default, skip_serializing_if = "Option::is_none")]
        total_count: Option<u64>,
    },
    Fail {
        source: String,
    },
}

impl FetchEvent {
    pub fn source(&self) -> &str {
        match self {
            Self::Complete { source, .. } | Self::Fail { source } => source,
        }
    }
}

/// Everything a fetcher reports for one chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchBatch {
    pub events: Vec<FetchEvent>,

    /// False once the external quota ran out during this chunk
    pub queries_left: bool,
}

/// External collaborator that pulls targets for a chunk of sources
#[async_trait]
pub trait TargetFetcher: Send + Sync {
    async fn fetch(&self, mode: CrawlMode, sources: &[CrawlSource]) -> Result<FetchBatch, FetchError>;
}

/// Builds the HTTP client shared by the fetcher and ranker adapters
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    let user_agent = format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

#[derive(Serialize)]
struct FetchRequest<'a> {
    sources: &'a [CrawlSource],
}

/// `TargetFetcher` backed by a fetch service over HTTP
///
/// Sends `POST {base}/fetch/{mode}` with the chunk's sources and cursors.
/// HTTP 429 and 403 are quota exhaustion; other non-success codes fail the
/// chunk.
pub struct HttpTargetFetcher {
    client: Client,
    base_url: String,
}

impl HttpTargetFetcher {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl TargetFetcher for HttpTargetFetcher {
    async fn fetch(&self, mode: CrawlMode, sources: &[CrawlSource]) -> Result<FetchBatch, FetchError> {
        let url = format!("{}/fetch/{}", self.base_url, mode);
        let response = self
            .client
            .post(&url)
            .json(&FetchRequest { sources })
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::FORBIDDEN {
            return Err(FetchError::RateLimited);
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        Ok(response.json::<FetchBatch>().await?)
    }
}
