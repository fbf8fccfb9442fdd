//! Quote types and upstream wire shapes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::resilience::DeadlineExceeded;

/// The relayed exchange rate. Serialized as `{"bid": "<decimal>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Quoted price, kept as decimal text exactly as the provider sent it.
    pub bid: String,
}

/// Provider payload: `{ "USDBRL": { "bid": "...", ...ignored } }`.
#[derive(Debug, Deserialize)]
pub(crate) struct ProviderResponse {
    #[serde(rename = "USDBRL")]
    pub usdbrl: ProviderQuote,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProviderQuote {
    pub bid: String,
}

/// Errors from a single upstream fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection or protocol failure talking to the provider.
    #[error("upstream request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// Provider answered with something other than 200.
    #[error("failed to get data, status code: {0}")]
    Status(u16),

    /// Body did not match the expected nested shape.
    #[error("failed to decode JSON response: {0}")]
    Decode(String),

    /// The fetch deadline ran out.
    #[error("upstream fetch timed out: {0}")]
    Timeout(#[from] DeadlineExceeded),
}
