use crate::state::AppState;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Waits for ctrl-c or SIGTERM, then cancels `token`.
pub async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = ?e, "failed to install ctrl-c handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(_) => return,
        };
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
        _ = token.cancelled() => return,
    }

    tracing::info!("shutdown requested");
    token.cancel();
}

/// Polls until every session has unregistered or `timeout` passes.
pub async fn drain_sessions(state: &AppState, timeout: Duration) {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let remaining = state.active_sessions();
        if remaining == 0 {
            return;
        }
        if tokio::time::Instant::now() >= deadline {
            tracing::warn!(remaining, "sessions still open at shutdown");
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k4bridge_core::config::Config;
    use std::sync::Arc;

    #[tokio::test]
    async fn drain_returns_once_sessions_close() {
        let state = Arc::new(AppState::new(Config::default()));
        let peer = "127.0.0.1:9".parse().unwrap();
        let (guard, _) = state.register_session("s1", peer);
        let releaser = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            drop(guard);
        });
        drain_sessions(&state, Duration::from_secs(2)).await;
        assert_eq!(state.active_sessions(), 0);
        releaser.await.unwrap();
    }

    #[tokio::test]
    async fn signal_future_ends_when_token_is_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        shutdown_signal(token).await;
    }
}
