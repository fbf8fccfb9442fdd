//! `GET /cotacao`: fetch the upstream quote, persist it, relay it.
//!
//! ```text
//! Received → FetchingUpstream → Persisting → Responded
//!     \______________\_______________\______→ Failed
//! ```
//!
//! The whole chain runs under the caller's deadline. Each step gets its own
//! child deadline derived by the configured policy.

use std::fmt;
use std::time::Instant;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};

use crate::http::request::{inbound_deadline, request_id};
use crate::http::response::RelayError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::resilience::Deadline;
use crate::upstream::Quote;

/// Where a relay request is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    FetchingUpstream,
    Persisting,
    Responded,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Received => "received",
            Stage::FetchingUpstream => "fetching_upstream",
            Stage::Persisting => "persisting",
            Stage::Responded => "responded",
            Stage::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

pub async fn cotacao(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Quote>, RelayError> {
    let start = Instant::now();
    let request_id = request_id(&headers);
    let inbound = inbound_deadline(&headers);

    tracing::debug!(
        request_id = %request_id,
        stage = %Stage::Received,
        remaining_ms = ?inbound.remaining().map(|d| d.as_millis()),
        "Relay request"
    );

    let result = relay(&state, &request_id, &inbound).await;

    match &result {
        Ok(quote) => {
            tracing::info!(request_id = %request_id, stage = %Stage::Responded, bid = %quote.bid, "Quote relayed");
            metrics::record_request(StatusCode::OK.as_u16(), start);
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, stage = %Stage::Failed, error = %e, "Relay failed");
            metrics::record_request(e.status().as_u16(), start);
        }
    }

    result.map(Json)
}

/// Run fetch then persist inside the caller's deadline.
pub async fn relay(
    state: &AppState,
    request_id: &str,
    inbound: &Deadline,
) -> Result<Quote, RelayError> {
    let timeouts = &state.timeouts;

    let chain = async {
        let fetch_deadline = inbound.child(timeouts.upstream(), timeouts.child_policy);
        tracing::debug!(request_id = %request_id, stage = %Stage::FetchingUpstream, budget_ms = timeouts.upstream_ms, "Entering stage");

        let fetch_start = Instant::now();
        let bid = state.upstream.fetch(&fetch_deadline).await;
        metrics::record_stage("upstream", outcome(&bid), fetch_start);
        let bid = bid?;

        let persist_deadline = inbound.child(timeouts.persist(), timeouts.child_policy);
        tracing::debug!(request_id = %request_id, stage = %Stage::Persisting, budget_ms = timeouts.persist_ms, "Entering stage");

        let persist_start = Instant::now();
        let record = state.store.append(&persist_deadline, &bid).await;
        metrics::record_stage("persist", outcome(&record), persist_start);
        let record = record?;

        tracing::debug!(request_id = %request_id, row_id = record.id, "Quote persisted");
        Ok::<_, RelayError>(Quote { bid: record.value })
    };

    inbound.run(chain).await.map_err(RelayError::Inbound)?
}

fn outcome<T, E>(result: &Result<T, E>) -> &'static str {
    if result.is_ok() {
        "ok"
    } else {
        "error"
    }
}
