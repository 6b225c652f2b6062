//! TCP link to the radio: connect, authenticate, initialize, and the single
//! writer task that owns the socket's write half.

use anyhow::Context;
use bytes::Bytes;
use k4bridge_core::{auth::auth_token, codec, config};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub const PING: &str = "PING;";
/// Returns the radio to receive. Sent on every session exit path.
pub const FAIL_SAFE_RX: &str = "RX;";
pub const READ_CHUNK: usize = 4096;

/// Opens the socket and writes the auth token as raw ASCII.
pub async fn connect(cfg: &config::Radio) -> anyhow::Result<TcpStream> {
    let addr = format!("{}:{}", cfg.host, cfg.port);
    let mut stream = tokio::time::timeout(
        Duration::from_secs(cfg.connect_timeout_secs),
        TcpStream::connect(&addr),
    )
    .await
    .with_context(|| format!("connect {addr}: timed out"))?
    .with_context(|| format!("connect {addr}"))?;

    if let Err(e) = stream.set_nodelay(true) {
        tracing::debug!(error = ?e, "set_nodelay failed");
    }

    stream
        .write_all(auth_token(&cfg.password).as_bytes())
        .await
        .context("send auth token")?;
    Ok(stream)
}

/// Sends the setup commands in order, pausing between them.
pub async fn initialize(stream: &mut TcpStream, cfg: &config::Radio, audio_mode: u8) -> anyhow::Result<()> {
    let delay = Duration::from_millis(cfg.init_command_delay_ms);
    for cmd in cfg.init_sequence(audio_mode) {
        stream
            .write_all(&codec::encode_cat(&cmd))
            .await
            .with_context(|| format!("send init command {cmd}"))?;
        tracing::trace!(command = %cmd, "init command sent");
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
    Ok(())
}

/// Best-effort fail-safe on a stream that never reached the writer task.
pub async fn send_fail_safe(stream: &mut TcpStream) {
    if let Err(e) = stream.write_all(&codec::encode_cat(FAIL_SAFE_RX)).await {
        tracing::warn!(error = ?e, "fail-safe RX could not be sent");
    }
    let _ = stream.shutdown().await;
}

/// Spawns the writer. Frames submitted through the returned sender are
/// written in order. Once every sender is dropped the writer finishes the
/// queue, writes `RX;` and shuts the socket down.
pub fn spawn_writer(
    mut writer: OwnedWriteHalf,
    queue: usize,
    session_id: String,
) -> (mpsc::Sender<Bytes>, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<Bytes>(queue.max(1));
    let handle = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if let Err(e) = writer.write_all(&frame).await {
                tracing::warn!(session_id = %session_id, error = ?e, "radio write failed");
                break;
            }
        }
        rx.close();

        match writer.write_all(&codec::encode_cat(FAIL_SAFE_RX)).await {
            Ok(()) => tracing::info!(session_id = %session_id, "fail-safe RX sent"),
            Err(e) => {
                tracing::warn!(session_id = %session_id, error = ?e, "fail-safe RX could not be sent")
            }
        }
        let _ = writer.flush().await;
        let _ = writer.shutdown().await;
    });
    (tx, handle)
}
