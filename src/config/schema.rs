//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay
//! and its requester. All types derive Serde traits for deserialization
//! from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::resilience::ChildDeadlinePolicy;

/// Root configuration shared by the relay server and the requester.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Deadline budgets for each hop of the cascade.
    pub timeouts: TimeoutConfig,

    /// External quote provider.
    pub upstream: UpstreamConfig,

    /// Durable sink for observed rates.
    pub storage: StorageConfig,

    /// Requester settings.
    pub client: ClientConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Deadline budgets, in milliseconds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// End-to-end budget the requester grants a single run.
    pub request_ms: u64,

    /// Budget for the upstream quote fetch.
    pub upstream_ms: u64,

    /// Budget for appending the quote to storage.
    pub persist_ms: u64,

    /// How child budgets relate to the inbound request's remaining time.
    pub child_policy: ChildDeadlinePolicy,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_ms: 300,
            upstream_ms: 2000,
            persist_ms: 10,
            child_policy: ChildDeadlinePolicy::Independent,
        }
    }
}

impl TimeoutConfig {
    pub fn request(&self) -> Duration {
        Duration::from_millis(self.request_ms)
    }

    pub fn upstream(&self) -> Duration {
        Duration::from_millis(self.upstream_ms)
    }

    pub fn persist(&self) -> Duration {
        Duration::from_millis(self.persist_ms)
    }

    /// True when independent child budgets together outlast the requester's budget.
    ///
    /// Both children can then succeed on their own clocks while the caller has
    /// already given up.
    pub fn cascade_exceeds_request(&self) -> bool {
        self.child_policy == ChildDeadlinePolicy::Independent
            && self.upstream_ms.saturating_add(self.persist_ms) > self.request_ms
    }
}

/// Upstream quote provider configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Fixed URL returning `{ "USDBRL": { "bid": "..." } }`.
    pub url: String,

    /// User-Agent header sent upstream.
    pub user_agent: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: "https://economia.awesomeapi.com.br/json/last/USD-BRL".to_string(),
            user_agent: concat!("cotacao-relay/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the sqlite database file.
    pub path: String,

    /// How long the engine waits on a locked database before failing.
    pub busy_timeout_ms: u64,

    /// Connections opened at startup and shared by all requests.
    pub connections: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "exchange.db".to_string(),
            busy_timeout_ms: 5000,
            connections: 4,
        }
    }
}

/// Requester configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Full URL of the relay endpoint.
    pub server_url: String,

    /// File overwritten with the latest quote.
    pub output_path: String,

    /// Treat a response without `bid` as a decode error instead of an empty value.
    pub strict_bid: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8080/cotacao".to_string(),
            output_path: "cotacao.txt".to_string(),
            strict_bid: false,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
