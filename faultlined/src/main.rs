//! Faultline daemon - deterministic fault-injection exchange.
//!
//! Impersonates a spot-trading REST API and serves scripted failure
//! sequences per endpoint, so a client's retry, rate-limit and ban handling
//! can be exercised repeatably.

#![forbid(unsafe_code)]

mod http_api;

use anyhow::{Context, Result};
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use faultline_common::{AttemptCounters, Endpoint, FaultInjector, LogConfig, init_logging};
use http_api::HttpState;

#[derive(Parser)]
#[command(name = "faultlined")]
#[command(author, version, about = "Faultline daemon - scripted fault-injection exchange API")]
struct Cli {
    /// Address to bind
    #[arg(long, env = "FAULTLINE_HOST", default_value = "127.0.0.1")]
    host: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "FAULTLINE_PORT", default_value = "8080")]
    port: u16,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_env("info").with_stderr();
    if cli.verbose {
        log_config = log_config.with_level("debug");
    }
    let _logging_guards = init_logging(&log_config)?;

    info!("Starting Faultline daemon...");
    for endpoint in Endpoint::ALL {
        match endpoint.cycle_len() {
            Some(cycle) => info!("Scripted endpoint {} (cycle {})", endpoint.path(), cycle),
            None => info!("Stateless endpoint {}", endpoint.path()),
        }
    }

    let state = HttpState {
        injector: FaultInjector::new(Arc::new(AttemptCounters::new())),
        version: env!("CARGO_PKG_VERSION"),
        started_at: Instant::now(),
        pid: std::process::id(),
    };

    let addr = SocketAddr::new(cli.host, cli.port);
    let (local_addr, server) = http_api::start_server(addr, state, shutdown_signal())
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    server
        .await
        .context("Server task panicked")?
        .with_context(|| format!("Server on {} failed", local_addr))?;

    info!("Faultline daemon stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}
