//! HTTP client for the external quote provider.
//!
//! # Responsibilities
//! - Issue one GET to the configured provider URL
//! - Decode the nested `USDBRL.bid` field
//! - Give up when the supplied deadline passes
//!
//! # Design Decisions
//! - One attempt, no retry or backoff
//! - Body is read fully before decoding so transport and decode failures stay distinct
//! - The reqwest client is built once and shared across requests

use reqwest::StatusCode;

use crate::config::UpstreamConfig;
use crate::resilience::Deadline;
use crate::upstream::types::{FetchError, ProviderResponse};

#[derive(Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    url: String,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(FetchError::Transport)?;

        Ok(Self {
            http,
            url: config.url.clone(),
        })
    }

    /// Fetch the current bid, bounded by `deadline`.
    pub async fn fetch(&self, deadline: &Deadline) -> Result<String, FetchError> {
        deadline.run(self.fetch_once()).await?
    }

    async fn fetch_once(&self) -> Result<String, FetchError> {
        tracing::debug!(url = %self.url, "Requesting upstream quote");

        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(FetchError::Transport)?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::warn!(url = %self.url, status = %status, "Upstream returned non-200");
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(FetchError::Transport)?;
        let decoded: ProviderResponse =
            serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))?;

        tracing::debug!(bid = %decoded.usdbrl.bid, "Upstream quote received");
        Ok(decoded.usdbrl.bid)
    }
}
