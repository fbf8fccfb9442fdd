//! One-shot requester: ask the relay for a quote and write it locally.
//!
//! # Responsibilities
//! - Bound the whole run by a single deadline
//! - Advertise the remaining budget to the relay
//! - Write the bid to the output file only if the deadline still holds
//!
//! # Design Decisions
//! - Single attempt; every failure is terminal for the run
//! - A missing `bid` key yields an empty value unless `strict_bid` is set
//! - Local write failures surface after the network round trip already succeeded

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

use crate::config::RelayConfig;
use crate::http::X_REQUEST_TIMEOUT_MS;
use crate::requester::output;
use crate::resilience::{Deadline, DeadlineExceeded};

#[derive(Debug, Error)]
pub enum RequestError {
    /// Connection or protocol failure talking to the relay.
    #[error("request error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The run's deadline expired.
    #[error("request timed out: {0}")]
    Timeout(#[from] DeadlineExceeded),

    /// Relay answered with something other than 200.
    #[error("server error - status code: {0}")]
    ServerStatus(u16),

    /// Body was not a flat string map, or lacked `bid` in strict mode.
    #[error("could not parse response: {0}")]
    Decode(String),

    /// The quote was received but could not be saved.
    #[error("could not save exchange rate: {0}")]
    LocalWrite(#[source] io::Error),
}

pub struct Requester {
    http: reqwest::Client,
    server_url: String,
    output_path: PathBuf,
    budget: Duration,
    strict_bid: bool,
}

impl Requester {
    pub fn new(config: &RelayConfig) -> Result<Self, RequestError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(RequestError::Transport)?;

        Ok(Self {
            http,
            server_url: config.client.server_url.clone(),
            output_path: PathBuf::from(&config.client.output_path),
            budget: config.timeouts.request(),
            strict_bid: config.client.strict_bid,
        })
    }

    /// Fetch the quote from the relay and overwrite the output file with it.
    ///
    /// Returns the bid that was written.
    pub async fn fetch_and_store(&self) -> Result<String, RequestError> {
        let deadline = Deadline::after(self.budget);

        let bid = deadline.run(self.fetch_bid(&deadline)).await??;

        if deadline.is_expired() {
            return Err(RequestError::Timeout(deadline.exceeded()));
        }

        output::write_quote(&self.output_path, &bid).map_err(RequestError::LocalWrite)?;
        tracing::debug!(path = %self.output_path.display(), bid = %bid, "Quote written");

        Ok(bid)
    }

    async fn fetch_bid(&self, deadline: &Deadline) -> Result<String, RequestError> {
        let mut request = self.http.get(&self.server_url);
        if let Some(remaining) = deadline.remaining() {
            request = request.header(X_REQUEST_TIMEOUT_MS, remaining.as_millis().to_string());
        }

        let response = request.send().await.map_err(RequestError::Transport)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(RequestError::ServerStatus(status.as_u16()));
        }

        let body = response.bytes().await.map_err(RequestError::Transport)?;
        extract_bid(&body, self.strict_bid)
    }
}

/// Pull `bid` out of a flat `{"key": "value"}` body.
pub fn extract_bid(body: &[u8], strict: bool) -> Result<String, RequestError> {
    let mut fields: HashMap<String, String> =
        serde_json::from_slice(body).map_err(|e| RequestError::Decode(e.to_string()))?;

    match fields.remove("bid") {
        Some(bid) => Ok(bid),
        None if strict => Err(RequestError::Decode("missing field `bid`".to_string())),
        None => Ok(String::new()),
    }
}
