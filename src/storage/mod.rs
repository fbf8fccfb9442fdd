//! Persistence subsystem.
//!
//! # Data Flow
//! ```text
//! process start
//!     → store.rs Store::open (create table if absent, open the connection pool)
//!
//! per request
//!     → Store::append(deadline, bid)
//!     → lease a connection
//!     → blocking pool: BEGIN / INSERT / COMMIT (rolled back if abandoned)
//!     → StoredRecord { id, value }
//! ```
//!
//! # Design Decisions
//! - Append-only: rows are never updated or merged
//! - Concurrent appends rely on the engine's own locking
//! - The pool is opened once and the handle cloned into every request

pub mod store;

pub use store::{Store, StoreError, StoredRecord};
