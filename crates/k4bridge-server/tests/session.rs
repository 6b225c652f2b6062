use futures::{SinkExt, StreamExt};
use k4bridge_core::{auth::auth_token, codec, codec::FrameBuffer, config::Config};
use k4bridge_server::{app, state::AppState};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;

const STEP: Duration = Duration::from_secs(5);

type Client =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<TcpStream>>;

struct MockRadio {
    stream: TcpStream,
    frames: FrameBuffer,
}

impl MockRadio {
    async fn accept(listener: &TcpListener, password: &str) -> Self {
        let (mut stream, _) = tokio::time::timeout(STEP, listener.accept())
            .await
            .expect("radio accept timed out")
            .unwrap();
        let token = auth_token(password);
        let mut got = vec![0u8; token.len()];
        stream.read_exact(&mut got).await.unwrap();
        assert_eq!(got, token.as_bytes());
        Self {
            stream,
            frames: FrameBuffer::new(),
        }
    }

    /// Next CAT text from the bridge, or `None` once the socket closes.
    async fn next_cat(&mut self) -> Option<String> {
        let mut buf = [0u8; 4096];
        loop {
            while let Some(packet) = self.frames.next_packet() {
                let packet = packet.unwrap();
                if packet.kind == codec::PayloadType::Cat {
                    return Some(packet.cat_text());
                }
            }
            let n = tokio::time::timeout(STEP, self.stream.read(&mut buf))
                .await
                .expect("radio read timed out")
                .unwrap();
            if n == 0 {
                return None;
            }
            self.frames.extend(&buf[..n]);
        }
    }

    async fn expect_cat(&mut self, want: &str) {
        loop {
            match self.next_cat().await {
                Some(text) if text == want => return,
                Some(_) => continue,
                None => panic!("radio closed before {want}"),
            }
        }
    }

    async fn send_cat(&mut self, text: &str) {
        self.stream.write_all(&codec::encode_cat(text)).await.unwrap();
    }
}

async fn next_json(ws: &mut Client) -> Value {
    loop {
        let msg = tokio::time::timeout(STEP, ws.next())
            .await
            .expect("client read timed out")
            .expect("websocket ended")
            .unwrap();
        if let Message::Text(t) = msg {
            return serde_json::from_str(&t).unwrap();
        }
    }
}

async fn start() -> (Arc<AppState>, SocketAddr, TcpListener) {
    let radio = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let mut cfg = Config::default();
    cfg.radio.host = "127.0.0.1".to_string();
    cfg.radio.port = radio.local_addr().unwrap().port();
    cfg.radio.password = "secret".to_string();
    cfg.radio.init_command_delay_ms = 0;
    cfg.radio.keepalive_interval_secs = 1;

    let state = Arc::new(AppState::new(cfg));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(app::serve_on(listener, state.clone()));
    (state, addr, radio)
}

async fn connect(addr: SocketAddr) -> Client {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
        .await
        .unwrap();
    ws
}

#[tokio::test]
async fn session_authenticates_initializes_and_bridges_cat() {
    let (state, addr, radio_listener) = start().await;
    let mut ws = connect(addr).await;
    let mut radio = MockRadio::accept(&radio_listener, "secret").await;

    let expected = state.cfg.radio.init_sequence(state.cfg.audio.mode);
    for cmd in &expected {
        assert_eq!(radio.next_cat().await.as_deref(), Some(cmd.as_str()));
    }

    let hello = next_json(&mut ws).await;
    assert_eq!(hello["type"], "audio_settings");
    assert_eq!(hello["settings"]["audio_routing"], "a.b");

    radio.send_cat("FA00014060000;").await;
    let cat = next_json(&mut ws).await;
    assert_eq!(cat["type"], "cat");
    assert_eq!(cat["text"], "FA00014060000;");
    assert_eq!(cat["response_type"], "ai_update");

    ws.send(Message::Text("FB00007040000;".into())).await.unwrap();
    radio.expect_cat("FB00007040000;").await;

    ws.send(Message::Text("KS200;".into())).await.unwrap();
    let rejected = next_json(&mut ws).await;
    assert_eq!(rejected["type"], "cat_rejected");
    assert_eq!(rejected["text"], "KS200;");

    ws.send(Message::Text(
        r#"{"type":"vfo_control","action":"set-mode","vfo":"A","mode":"CW"}"#.into(),
    ))
    .await
    .unwrap();
    radio.expect_cat("MD3;").await;
    let reply = next_json(&mut ws).await;
    assert_eq!(reply["type"], "vfo_response");
    assert_eq!(reply["status"], "success");

    ws.send(Message::Text("DISCONNECT".into())).await.unwrap();
    radio.expect_cat("RX;").await;
    assert_eq!(radio.next_cat().await, None);
}

#[tokio::test]
async fn out_of_range_controls_are_answered_and_never_forwarded() {
    let (_state, addr, radio_listener) = start().await;
    let mut ws = connect(addr).await;
    let mut radio = MockRadio::accept(&radio_listener, "secret").await;
    radio.expect_cat("#SPN50000;").await;
    assert_eq!(next_json(&mut ws).await["type"], "audio_settings");

    ws.send(Message::Text(
        r#"{"type":"vfo_control","action":"set-frequency","vfo":"A","frequency":0}"#.into(),
    ))
    .await
    .unwrap();
    let reply = next_json(&mut ws).await;
    assert_eq!(reply["type"], "vfo_response");
    assert_eq!(reply["status"], "error");

    ws.send(Message::Text(
        r#"{"type":"filter_control","action":"update-values","filter_state":{"bw":-1.0,"shft":1.5}}"#
            .into(),
    ))
    .await
    .unwrap();
    let reply = next_json(&mut ws).await;
    assert_eq!(reply["type"], "filter_response");
    assert_eq!(reply["status"], "error");

    // A valid query after the rejections is the next CAT the radio sees.
    ws.send(Message::Text("FA;".into())).await.unwrap();
    loop {
        let text = radio.next_cat().await.expect("radio closed");
        assert!(!text.starts_with("FA0"), "{text}");
        assert!(!text.starts_with("BW") && !text.starts_with("IS"), "{text}");
        if text == "FA;" {
            break;
        }
    }
}

#[tokio::test]
async fn ptt_text_is_not_forwarded_and_keepalive_pings() {
    let (_state, addr, radio_listener) = start().await;
    let mut ws = connect(addr).await;
    let mut radio = MockRadio::accept(&radio_listener, "secret").await;
    radio.expect_cat("#SPN50000;").await;
    assert_eq!(next_json(&mut ws).await["type"], "audio_settings");

    ws.send(Message::Text("TX;".into())).await.unwrap();
    ws.send(Message::Text("FA;".into())).await.unwrap();
    // Only the query reaches the radio; PTT text stays local.
    loop {
        let text = radio.next_cat().await.expect("radio closed");
        assert_ne!(text, "TX;");
        if text == "FA;" {
            break;
        }
    }
    radio.expect_cat("PING;").await;
}

#[tokio::test]
async fn client_drop_sends_fail_safe_rx() {
    let (state, addr, radio_listener) = start().await;
    let ws = connect(addr).await;
    let mut radio = MockRadio::accept(&radio_listener, "secret").await;
    radio.expect_cat("#SPN50000;").await;

    drop(ws);
    radio.expect_cat("RX;").await;
    assert_eq!(radio.next_cat().await, None);

    tokio::time::timeout(STEP, async {
        while state.active_sessions() > 0 {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("session did not unregister");
}

#[tokio::test]
async fn shutdown_cancels_sessions_with_fail_safe() {
    let (state, addr, radio_listener) = start().await;
    let mut ws = connect(addr).await;
    let mut radio = MockRadio::accept(&radio_listener, "secret").await;
    radio.expect_cat("#SPN50000;").await;
    assert_eq!(next_json(&mut ws).await["type"], "audio_settings");

    state.shutdown.cancel();
    radio.expect_cat("RX;").await;
}

#[tokio::test]
async fn unreachable_radio_reports_error_to_client() {
    let unused = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = unused.local_addr().unwrap().port();
    drop(unused);

    let mut cfg = Config::default();
    cfg.radio.host = "127.0.0.1".to_string();
    cfg.radio.port = port;
    cfg.radio.connect_timeout_secs = 1;
    let state = Arc::new(AppState::new(cfg));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(app::serve_on(listener, state));

    let mut ws = connect(addr).await;
    let msg = next_json(&mut ws).await;
    assert_eq!(msg["type"], "error");
}
