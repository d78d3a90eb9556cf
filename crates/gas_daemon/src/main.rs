//! HTTP daemon for interactive gas balance sessions.
//!
//! Serves the simulation engine over a JSON API: clients open a session,
//! edit the scenario field by field, and read back series, KPI snapshots
//! and alerts. An SSE stream tells clients when a session changed so they
//! can refetch instead of polling.

mod alerts;
mod routes;
mod state;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gas_daemon", about = "Gas balance and ventilation staging daemon")]
struct Cli {
    /// Listen address.
    #[arg(long, default_value = "127.0.0.1:8080")]
    addr: String,

    /// Log filter, e.g. `info` or `gas_daemon=debug`.
    #[arg(long, default_value = "info")]
    log: String,

    /// Template scenario file for new sessions; the built-in plant when absent.
    #[arg(long)]
    scenario: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_new(&cli.log).context("parsing --log filter")?,
        )
        .init();

    let template = match &cli.scenario {
        Some(path) => gas_scenario::load_scenario(path)
            .with_context(|| format!("loading template scenario {}", path.display()))?,
        None => gas_scenario::default_scenario(),
    };
    tracing::info!(
        zones = template.zones.len(),
        gases = template.gases.len(),
        "template scenario ready"
    );

    let app = routes::make_router(state::AppState::new(template));
    let listener = tokio::net::TcpListener::bind(&cli.addr)
        .await
        .with_context(|| format!("binding {}", cli.addr))?;
    tracing::info!(addr = %cli.addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to install the shutdown handler: {err}");
        return;
    }
    tracing::info!("shutdown signal received");
}
