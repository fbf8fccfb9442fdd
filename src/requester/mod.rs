//! Requester subsystem.
//!
//! # Data Flow
//! ```text
//! Deadline::after(request budget)
//!     → client.rs (GET relay, advertise remaining budget)
//!     → extract bid from {"bid": ..}
//!     → output.rs (overwrite local file with "Dólar: <bid>")
//! ```

pub mod client;
pub mod output;

pub use client::{RequestError, Requester};
