//! Upstream quote provider subsystem.
//!
//! # Data Flow
//! ```text
//! relay handler
//!     → client.rs (GET provider URL under the fetch deadline)
//!     → types.rs (decode { "USDBRL": { "bid": .. } })
//!     → bid text back to the handler
//! ```

pub mod client;
pub mod types;

pub use client::UpstreamClient;
pub use types::{FetchError, Quote};
