use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::error::BackendError;
use crate::suggest::suggest_model::{ScoringRequest, ScoringResponse};

/// Remote (or mocked) scorer for one shard of descriptors.
#[async_trait]
pub trait ScoringBackend: Send + Sync {
    async fn score(&self, request: ScoringRequest) -> Result<ScoringResponse, BackendError>;
}

// ============================================================================
// HTTP backend
// ============================================================================

/// Posts `{intent, elements}` as JSON and expects a `ScoringResponse` back.
pub struct HttpScoringBackend {
    endpoint: String,
    client: Client,
}

impl HttpScoringBackend {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: endpoint.to_string(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ScoringBackend for HttpScoringBackend {
    async fn score(&self, request: ScoringRequest) -> Result<ScoringResponse, BackendError> {
        debug!(
            endpoint = %self.endpoint,
            shard = request.shard,
            elements = request.elements.len(),
            "posting shard"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json::<ScoringResponse>().await?)
    }
}
