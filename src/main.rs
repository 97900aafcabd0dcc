// src/main.rs

use anyhow::Context;
use chat_relay::{build_router, config::load_settings, state::AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chat_relay=info")),
        )
        .init();

    let settings = load_settings().context("failed to load relay settings")?;
    let addr = settings.socket_addr()?;

    let state = AppState::from_settings(&settings);
    let app = build_router(state, &settings.allowed_origin)?;

    tracing::info!(
        %addr,
        origin = %settings.allowed_origin,
        history_capacity = settings.history.capacity,
        "relay listening"
    );
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await?;
    Ok(())
}
