//! goyagi server binary.
//!
//! Loads config, builds the application, and serves until SIGINT/SIGTERM,
//! then drains in-flight requests within `server.shutdown_timeout_ms`.

use std::process::ExitCode;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use goyagi_core::error::Result;
use goyagi_server::{app_state::AppState, config, lifecycle, router};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run().await {
        Ok(()) => {
            tracing::info!("server stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "server stopped");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let state = AppState::from_config(config::load()?).await?;
    let cfg = state.cfg();
    let listen = cfg.server.listen_addr()?;
    let drain_timeout = cfg.server.drain_timeout();
    tracing::info!(environment = %cfg.environment, %listen, "goyagi starting");

    let app = router::build_router(state.clone());

    let shutdown = lifecycle::setup();
    let server = lifecycle::Server::new(app, drain_timeout).bind(listen).await?;

    tracing::info!(addr = %server.local_addr(), "server started");
    server.serve(shutdown).await
}
