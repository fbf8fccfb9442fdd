//! Quote relay server.
//!
//! # Architecture Overview
//!
//! ```text
//!   requester ──GET /cotacao──▶ ┌──────────────────────────────────────────┐
//!   (deadline: request_ms)      │                  relay                    │
//!                               │   inbound deadline (caller's budget)      │
//!                               │     ├─ upstream fetch (upstream_ms) ──────┼──▶ quote provider
//!                               │     └─ persist        (persist_ms)  ──────┼──▶ sqlite
//!   ◀──── {"bid": ..} / 500 ─── └──────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use cotacao_relay::config::load_or_default;
use cotacao_relay::lifecycle::signals;
use cotacao_relay::observability::{logging, metrics};
use cotacao_relay::{RelayServer, Shutdown, Store};

#[derive(Parser)]
#[command(name = "cotacao-relay")]
#[command(about = "Relays the USD/BRL exchange rate and records every observation", long_about = None)]
struct Args {
    /// Path to a TOML config file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_or_default(args.config.as_deref())?;

    logging::init_logging(&config.observability.log_level);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream_ms = config.timeouts.upstream_ms,
        persist_ms = config.timeouts.persist_ms,
        child_policy = ?config.timeouts.child_policy,
        "Configuration loaded"
    );

    if config.timeouts.cascade_exceeds_request() {
        tracing::warn!(
            request_ms = config.timeouts.request_ms,
            upstream_ms = config.timeouts.upstream_ms,
            persist_ms = config.timeouts.persist_ms,
            "Independent child budgets exceed the requester's budget; callers may give up before a relay finishes"
        );
    }

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let store = Store::open(&config.storage)?;
    tracing::info!(path = %config.storage.path, "Storage opened");

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    signals::spawn_signal_listener(shutdown);

    let server = RelayServer::new(config, store)?;
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
