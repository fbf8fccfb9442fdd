//! Response handling.
//!
//! # Responsibilities
//! - Map relay failures to HTTP responses
//!
//! # Design Decisions
//! - Every failure is a 500 carrying the raw error text as a plain-text body
//! - A fetched value is never returned unless it was also persisted

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::resilience::DeadlineExceeded;
use crate::storage::StoreError;
use crate::upstream::FetchError;

/// Terminal failure of one relay request.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The caller's own deadline ran out mid-chain.
    #[error("request deadline exceeded: {0}")]
    Inbound(DeadlineExceeded),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}
