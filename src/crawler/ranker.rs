//! Similarity ranker contract and HTTP adapter

use crate::storage::Costar;
use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RankError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Ranking service returned HTTP {status}")]
    Status { status: u16 },
}

/// External collaborator ranking repos by shared-gazer overlap
#[async_trait]
pub trait SimilarityRanker: Send + Sync {
    async fn rank(&self, repo: &str) -> Result<Vec<Costar>, RankError>;
}

/// `SimilarityRanker` backed by `GET {base}/similar?repo=<id>`
pub struct HttpSimilarityRanker {
    client: Client,
    base_url: String,
}

impl HttpSimilarityRanker {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl SimilarityRanker for HttpSimilarityRanker {
    async fn rank(&self, repo: &str) -> Result<Vec<Costar>, RankError> {
        let response = self
            .client
            .get(format!("{}/similar", self.base_url))
            .query(&[("repo", repo)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RankError::Status {
                status: status.as_u16(),
            });
        }

        Ok(response.json::<Vec<Costar>>().await?)
    }
}
