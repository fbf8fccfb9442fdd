//! Exchange-rate relay with cascading deadlines.
//!
//! A requester asks the relay for the current USD/BRL bid under its own
//! deadline. The relay fetches the quote upstream and persists it, each step
//! under its own child deadline, all nested inside the caller's budget.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod requester;
pub mod resilience;
pub mod storage;
pub mod upstream;

pub use config::schema::RelayConfig;
pub use http::RelayServer;
pub use lifecycle::Shutdown;
pub use requester::Requester;
pub use resilience::{ChildDeadlinePolicy, Deadline};
pub use storage::Store;
pub use upstream::Quote;
