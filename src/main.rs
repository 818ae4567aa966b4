//! `relying-party` binary: serves the OAuth relying party over HTTP.
//!
//! Configuration comes from `APP_*` environment variables, log filtering
//! from `RUST_LOG`.

use anyhow::{Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use oauth_relying_party::server::{router, AppState};
use oauth_relying_party::AppConfig;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = AppConfig::from_env().context("Invalid configuration")?;
    let addr = config.bind_addr();
    tracing::info!(
        %addr,
        service_url = %config.service_url(),
        redirect_uri = %config.redirect_uri(),
        "Starting relying party"
    );

    let state = AppState::from_config(config).context("Failed to build HTTP client")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    axum::serve(listener, router(state))
        .await
        .context("Server error")?;

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("oauth_relying_party=info,relying_party=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
