use anyhow::Context;
use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::IsTerminal;
use std::time::Duration;
use tokio_tungstenite::tungstenite::Message;

#[derive(Debug, Parser)]
#[command(
    name = "ws_probe",
    version,
    about = "Connect to a K4 bridge session socket and print a short traffic summary."
)]
struct Args {
    /// WebSocket URL
    #[arg(long, default_value = "ws://127.0.0.1:8000/ws")]
    url: String,

    /// Raw CAT text to send after connecting (repeatable, e.g. --cat "FA;")
    #[arg(long)]
    cat: Vec<String>,

    /// Control JSON to send after connecting (repeatable)
    #[arg(long)]
    json: Vec<String>,

    /// How long to listen before disconnecting
    #[arg(long, default_value_t = 5)]
    seconds: u64,
}

#[derive(Debug, Default)]
struct Summary {
    by_type: BTreeMap<String, usize>,
    binary_messages: usize,
    binary_bytes: usize,
    last_spectrum: Option<Value>,
}

impl Summary {
    fn record_text(&mut self, text: &str) {
        let parsed: Option<Value> = serde_json::from_str(text).ok();
        let kind = parsed
            .as_ref()
            .and_then(|v| v.get("type"))
            .and_then(Value::as_str)
            .unwrap_or("non_json")
            .to_string();
        if kind == "spectrum_data" {
            self.last_spectrum = parsed;
        }
        *self.by_type.entry(kind).or_default() += 1;
    }

    fn report(&self) {
        for (kind, count) in &self.by_type {
            tracing::info!(kind = %kind, count, "text messages");
        }
        tracing::info!(
            messages = self.binary_messages,
            bytes = self.binary_bytes,
            "binary audio"
        );
        if let Some(s) = &self.last_spectrum {
            tracing::info!(
                center_frequency = %s["center_frequency"],
                span = %s["span"],
                bins = %s["bins"],
                start = %s["actual_start_freq"],
                end = %s["actual_end_freq"],
                "last spectrum"
            );
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_ansi(std::io::stdout().is_terminal())
        .with_writer(std::io::stdout)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("init tracing: {e}"))?;

    let args = Args::parse();
    for raw in &args.json {
        serde_json::from_str::<Value>(raw).with_context(|| format!("--json {raw:?}"))?;
    }

    let (mut ws, _) = tokio_tungstenite::connect_async(args.url.as_str())
        .await
        .with_context(|| format!("connect {}", args.url))?;
    tracing::info!(url = %args.url, "connected");

    for text in args.json.iter().chain(args.cat.iter()) {
        ws.send(Message::Text(text.clone()))
            .await
            .context("send")?;
    }

    let mut summary = Summary::default();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(args.seconds);
    loop {
        let msg = match tokio::time::timeout_at(deadline, ws.next()).await {
            Err(_) => break,
            Ok(None) => {
                tracing::info!("server closed the connection");
                break;
            }
            Ok(Some(msg)) => msg.context("read message")?,
        };
        match msg {
            Message::Text(t) => summary.record_text(&t),
            Message::Binary(b) => {
                summary.binary_messages += 1;
                summary.binary_bytes += b.len();
            }
            Message::Close(frame) => {
                tracing::info!(frame = ?frame, "close");
                break;
            }
            _ => {}
        }
    }

    let _ = ws.send(Message::Text("DISCONNECT".to_string())).await;
    let _ = ws.close(None).await;
    summary.report();
    Ok(())
}
