//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4)
//! - Derive the inbound deadline from the caller's advertised budget
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - A missing or malformed budget header means no deadline beyond the connection itself

use axum::http::{HeaderMap, HeaderName, HeaderValue, Request};
use std::time::Duration;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::resilience::Deadline;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Remaining budget, in milliseconds, the caller grants this request.
pub const X_REQUEST_TIMEOUT_MS: &str = "x-request-timeout-ms";

pub fn request_id_header() -> HeaderName {
    HeaderName::from_static(X_REQUEST_ID)
}

/// Generates a UUID v4 request ID for requests that arrive without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

/// The deadline the caller imposed on this request.
pub fn inbound_deadline(headers: &HeaderMap) -> Deadline {
    headers
        .get(X_REQUEST_TIMEOUT_MS)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(|ms| Deadline::after(Duration::from_millis(ms)))
        .unwrap_or_else(Deadline::unbounded)
}
