//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Relay handler and requester produce:
//!     → logging.rs (structured log events, request id as a field)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout
//!     → Metrics endpoint (Prometheus scrape), when enabled
//! ```

pub mod logging;
pub mod metrics;
