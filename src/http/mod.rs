//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, inbound deadline)
//!     → handler.rs (fetch upstream, persist, relay)
//!     → response.rs (errors → 500 text/plain)
//!     → Send to client
//! ```

pub mod handler;
pub mod request;
pub mod response;
pub mod server;

pub use handler::Stage;
pub use request::{X_REQUEST_ID, X_REQUEST_TIMEOUT_MS};
pub use response::RelayError;
pub use server::{AppState, RelayServer};
