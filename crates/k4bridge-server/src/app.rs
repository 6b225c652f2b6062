use crate::{shutdown, state, ws};
use anyhow::Context;
use axum::{routing::get, Router};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::{compression::CompressionLayer, services::ServeDir};

const SESSION_DRAIN_TIMEOUT: Duration = Duration::from_secs(3);

pub fn router(state: Arc<state::AppState>) -> Router {
    let html_root = state.html_root.clone();

    Router::new()
        .route("/ws", get(ws::session::upgrade))
        .route("/config/panadapter", get(state::panadapter_config))
        .route("/config/audio", get(state::audio_config))
        .route("/api/config/all", get(state::all_config))
        .route("/api/stats", get(state::stats))
        .nest_service(
            "/",
            ServeDir::new(html_root).append_index_html_on_directories(true),
        )
        .layer(CompressionLayer::new())
        .with_state(state)
}

pub async fn serve(state: Arc<state::AppState>) -> anyhow::Result<()> {
    let host = state.cfg.server.host.clone();
    let port = state.cfg.server.port;
    let host = if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]")
    } else {
        host
    };
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .context("parse bind address")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    tracing::info!(
        bind = %addr,
        radio_host = %state.cfg.radio.host,
        radio_port = state.cfg.radio.port,
        "server listening"
    );

    serve_on(listener, state).await
}

/// Serves on an already bound listener until the shutdown token fires, then
/// waits for sessions to finish their fail-safe.
pub async fn serve_on(
    listener: tokio::net::TcpListener,
    state: Arc<state::AppState>,
) -> anyhow::Result<()> {
    let token = state.shutdown.clone();
    axum::serve(
        listener,
        router(state.clone()).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move { token.cancelled().await })
    .await?;

    shutdown::drain_sessions(&state, SESSION_DRAIN_TIMEOUT).await;
    Ok(())
}
