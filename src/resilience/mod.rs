//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request (caller budget or unbounded)
//!     → deadline.rs (parent Deadline)
//!         → child(upstream budget)  → upstream fetch
//!         → child(persist budget)   → storage append
//! ```
//!
//! # Design Decisions
//! - Every external call has a deadline
//! - No retries: a failed or expired step is terminal for its request
//! - Parent expiry aborts the in-flight child, never the other way round

pub mod deadline;

pub use deadline::{ChildDeadlinePolicy, Deadline, DeadlineExceeded};
