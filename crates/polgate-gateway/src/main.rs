//! polgate gateway
//!
//! HTTP front for the policy admin service:
//! - /policies, /policy, /validate, /auditlog
//! - static assets for the browser client on every other path
//! - one admin RPC per request, fresh connection each time

use tracing_subscriber::{fmt, EnvFilter};

use polgate_core::error::{GatewayError, Result};
use polgate_gateway::{app_state, config, router};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "polgate-gateway failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cfg = config::load()?;
    let listen = cfg.gateway.listen_addr()?;

    let state = app_state::AppState::new(cfg)?;
    let app = router::build_router(state);

    tracing::info!(%listen, "polgate-gateway starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| GatewayError::Internal(format!("failed to bind {listen}: {e}")))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| GatewayError::Internal(format!("server failed: {e}")))
}
