//! One WebSocket client bridged to one radio link.
//!
//! Three loops run side by side: client messages, radio reads and the
//! keepalive timer. The first one to finish ends the session. Every exit
//! path goes through the radio writer, which sends `RX;` last.

use crate::radio::{self, PING, READ_CHUNK};
use crate::state::{AppState, Counter, SessionStats};
use axum::{
    extract::connect_info::ConnectInfo,
    extract::{ws, State, WebSocketUpgrade},
};
use bytes::Bytes;
use futures::stream::SplitStream;
use futures::{SinkExt, StreamExt};
use k4bridge_core::{
    audio::{
        tx::{audio_payload, TxSequence},
        RxDecoder, SessionAudioState, TxEncoder,
    },
    cat::{self, CommandHistory, Direction, ResponseKind},
    codec::{self, FrameBuffer, Packet, PayloadType},
    config::Config,
    panadapter::Panadapter,
    protocol::{classify_text, ClientMessage, ClientText, ServerMessage, Status},
    util::generate_session_id,
};
use serde_json::Map;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::io::AsyncReadExt;
use tokio::net::tcp::OwnedReadHalf;
use tokio::sync::{mpsc, watch};

const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);
const CLIENT_FLUSH_TIMEOUT: Duration = Duration::from_millis(500);

pub async fn upgrade(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<Arc<AppState>>,
) -> axum::response::Response {
    ws.on_upgrade(move |socket| handle(socket, state, addr))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Connecting,
    Authenticated,
    Initializing,
    Active,
    Closing,
    Closed,
}

impl Phase {
    fn as_str(self) -> &'static str {
        match self {
            Phase::Connecting => "connecting",
            Phase::Authenticated => "authenticated",
            Phase::Initializing => "initializing",
            Phase::Active => "active",
            Phase::Closing => "closing",
            Phase::Closed => "closed",
        }
    }
}

fn enter(session_id: &str, phase: Phase) {
    tracing::info!(session_id, phase = phase.as_str(), "session phase");
}

/// Why a session ended.
#[derive(Debug)]
enum Exit {
    ClientClosed,
    ClientRequested,
    ClientErrors(u32),
    RadioClosed,
    RadioIo(std::io::Error),
    WriterGone,
    Shutdown,
}

enum Outbound {
    Text(String),
    Binary(Vec<u8>),
}

impl From<ServerMessage> for Outbound {
    fn from(msg: ServerMessage) -> Self {
        Outbound::Text(msg.to_json())
    }
}

#[derive(Debug, Default)]
struct Ptt {
    active: bool,
    since: Option<Instant>,
}

impl Ptt {
    fn press(&mut self) {
        self.active = true;
        self.since = Some(Instant::now());
    }

    fn release(&mut self) -> Option<Duration> {
        self.active = false;
        self.since.take().map(|t| t.elapsed())
    }
}

async fn handle(socket: ws::WebSocket, state: Arc<AppState>, peer: SocketAddr) {
    let session_id = generate_session_id();
    let (_session_guard, stats) = state.register_session(&session_id, peer);
    tracing::info!(session_id = %session_id, peer = %peer, "client ws connected");

    let (mut ws_sender, ws_receiver) = socket.split();
    let cfg = state.cfg.clone();

    enter(&session_id, Phase::Connecting);
    let mut stream = match radio::connect(&cfg.radio).await {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(session_id = %session_id, error = ?e, "radio connect failed");
            let msg = ServerMessage::Error {
                message: format!("radio connection failed: {e:#}"),
            };
            let _ = ws_sender.send(ws::Message::Text(msg.to_json())).await;
            let _ = ws_sender.close().await;
            enter(&session_id, Phase::Closed);
            return;
        }
    };
    enter(&session_id, Phase::Authenticated);

    enter(&session_id, Phase::Initializing);
    if let Err(e) = radio::initialize(&mut stream, &cfg.radio, cfg.audio.mode).await {
        tracing::warn!(session_id = %session_id, error = ?e, "radio init failed");
        enter(&session_id, Phase::Closing);
        radio::send_fail_safe(&mut stream).await;
        let _ = ws_sender.close().await;
        enter(&session_id, Phase::Closed);
        return;
    }

    let (reader, writer) = stream.into_split();
    let (radio_tx, writer_task) =
        radio::spawn_writer(writer, cfg.session.outbound_queue, session_id.clone());

    let (client_tx, mut client_rx) = mpsc::channel::<Outbound>(cfg.session.outbound_queue.max(1));
    let send_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                Some(out) = client_rx.recv() => {
                    let msg = match out {
                        Outbound::Text(t) => ws::Message::Text(t),
                        Outbound::Binary(b) => ws::Message::Binary(b),
                    };
                    if ws_sender.send(msg).await.is_err() {
                        break;
                    }
                }
                else => break,
            }
        }
        let _ = ws_sender.close().await;
    });

    let audio_state = SessionAudioState::from_config(&cfg.audio);
    let (audio_tx, audio_rx) = watch::channel(audio_state);
    let session = Session {
        id: session_id.clone(),
        history: Mutex::new(CommandHistory::new(
            cfg.session.history_capacity,
            Duration::from_millis(cfg.session.recent_window_ms),
        )),
        cfg,
        stats,
        radio: radio_tx,
        client: client_tx,
    };

    let exit = match session
        .to_client(ServerMessage::AudioSettings {
            settings: audio_state.settings(),
        })
        .await
    {
        Err(exit) => exit,
        Ok(()) => {
            enter(&session_id, Phase::Active);
            let shutdown = state.shutdown.clone();
            tokio::select! {
                exit = session.client_loop(ws_receiver, audio_tx) => exit,
                exit = session.radio_loop(reader, audio_rx) => exit,
                exit = session.keepalive_loop() => exit,
                _ = shutdown.cancelled() => Exit::Shutdown,
            }
        }
    };

    enter(&session_id, Phase::Closing);
    tracing::info!(session_id = %session_id, reason = ?exit, "session ending");

    // Dropping the last radio sender lets the writer finish with `RX;`.
    drop(session);
    if tokio::time::timeout(WRITER_DRAIN_TIMEOUT, writer_task)
        .await
        .is_err()
    {
        tracing::warn!(session_id = %session_id, "radio writer did not finish in time");
    }
    let abort = send_task.abort_handle();
    if tokio::time::timeout(CLIENT_FLUSH_TIMEOUT, send_task)
        .await
        .is_err()
    {
        abort.abort();
    }

    enter(&session_id, Phase::Closed);
}

struct Session {
    id: String,
    cfg: Arc<Config>,
    stats: Arc<SessionStats>,
    radio: mpsc::Sender<Bytes>,
    client: mpsc::Sender<Outbound>,
    history: Mutex<CommandHistory>,
}

impl Session {
    async fn to_radio(&self, frame: Bytes) -> Result<(), Exit> {
        self.radio.send(frame).await.map_err(|_| Exit::WriterGone)
    }

    async fn to_client(&self, out: impl Into<Outbound>) -> Result<(), Exit> {
        self.client
            .send(out.into())
            .await
            .map_err(|_| Exit::ClientClosed)
    }

    fn history(&self) -> std::sync::MutexGuard<'_, CommandHistory> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Forwards one CAT command and records it as sent.
    async fn forward_cat(&self, text: &str) -> Result<(), Exit> {
        self.to_radio(codec::encode_cat(text)).await?;
        self.history().record(text, Direction::Sent);
        tracing::debug!(session_id = %self.id, command = %text, "cat forwarded");
        Ok(())
    }

    async fn client_loop(
        &self,
        mut ws_receiver: SplitStream<ws::WebSocket>,
        audio: watch::Sender<SessionAudioState>,
    ) -> Exit {
        let mut encoder = TxEncoder::new(&self.cfg.audio);
        let mut sequence = TxSequence::default();
        let mut ptt = Ptt::default();
        let mut consecutive_errors = 0u32;
        let max_errors = self.cfg.session.max_consecutive_errors.max(1);

        loop {
            let msg = match ws_receiver.next().await {
                None => return Exit::ClientClosed,
                Some(Err(e)) => {
                    consecutive_errors += 1;
                    tracing::warn!(
                        session_id = %self.id,
                        error = ?e,
                        consecutive_errors,
                        "client receive error"
                    );
                    if consecutive_errors >= max_errors {
                        return Exit::ClientErrors(consecutive_errors);
                    }
                    continue;
                }
                Some(Ok(msg)) => {
                    consecutive_errors = 0;
                    msg
                }
            };

            let result = match msg {
                ws::Message::Text(txt) => self.handle_text(&txt, &audio, &mut ptt).await,
                ws::Message::Binary(pcm) => {
                    self.send_tx_audio(&mut encoder, &mut sequence, &pcm, &ptt)
                        .await
                }
                ws::Message::Close(_) => Err(Exit::ClientClosed),
                _ => Ok(()),
            };
            if let Err(exit) = result {
                return exit;
            }
        }
    }

    async fn handle_text(
        &self,
        txt: &str,
        audio: &watch::Sender<SessionAudioState>,
        ptt: &mut Ptt,
    ) -> Result<(), Exit> {
        match classify_text(txt) {
            ClientText::Control(Ok(msg)) => self.handle_control(msg, audio).await,
            ClientText::Control(Err(e)) => {
                tracing::debug!(session_id = %self.id, error = %e, "invalid control message");
                self.to_client(ServerMessage::Error {
                    message: format!("invalid control message: {e}"),
                })
                .await
            }
            ClientText::Disconnect => Err(Exit::ClientRequested),
            ClientText::Cat(text) => {
                for cmd in text
                    .split_inclusive(';')
                    .map(str::trim)
                    .filter(|c| !c.is_empty())
                {
                    self.handle_client_cat(cmd, ptt).await?;
                }
                Ok(())
            }
            ClientText::Unrecognized(text) => {
                tracing::debug!(session_id = %self.id, text, "unrecognized client text");
                self.to_client(ServerMessage::Error {
                    message: format!("unrecognized message: {text}"),
                })
                .await
            }
        }
    }

    async fn handle_client_cat(&self, cmd: &str, ptt: &mut Ptt) -> Result<(), Exit> {
        match cmd {
            "TX;" => {
                ptt.press();
                tracing::debug!(session_id = %self.id, "ptt pressed");
                Ok(())
            }
            "RX;" => {
                let held = ptt.release();
                tracing::debug!(session_id = %self.id, held_ms = held.map(|d| d.as_millis() as u64), "ptt released");
                Ok(())
            }
            _ => match cat::parse(cmd) {
                Ok(_) => self.forward_cat(cmd).await,
                Err(e) => {
                    self.stats.incr(Counter::CatRejected);
                    tracing::debug!(session_id = %self.id, command = %cmd, error = %e, "cat rejected");
                    self.to_client(ServerMessage::CatRejected {
                        text: cmd.to_string(),
                        error: e.to_string(),
                    })
                    .await
                }
            },
        }
    }

    async fn handle_control(
        &self,
        msg: ClientMessage,
        audio: &watch::Sender<SessionAudioState>,
    ) -> Result<(), Exit> {
        match msg {
            ClientMessage::AudioControl(control) => {
                let mut result = Ok(());
                audio.send_modify(|state| result = control.apply(state));
                match result {
                    Ok(()) => {
                        let settings = audio.borrow().settings();
                        self.to_client(ServerMessage::AudioSettings { settings }).await
                    }
                    Err(e) => {
                        self.to_client(ServerMessage::Error {
                            message: e.to_string(),
                        })
                        .await
                    }
                }
            }
            ClientMessage::VfoControl(control) => {
                let reply = match control.command() {
                    Ok(cmd) => {
                        self.forward_cat(&cmd).await?;
                        ServerMessage::VfoResponse {
                            action: control.action,
                            status: Status::Success,
                            error: None,
                        }
                    }
                    Err(e) => ServerMessage::VfoResponse {
                        action: control.action,
                        status: Status::Error,
                        error: Some(e.to_string()),
                    },
                };
                self.to_client(reply).await
            }
            ClientMessage::FilterControl(control) => {
                let reply = match control.commands() {
                    Ok(cmds) => {
                        for cmd in &cmds {
                            self.forward_cat(cmd).await?;
                        }
                        ServerMessage::FilterResponse {
                            action: control.action,
                            status: Status::Success,
                            error: None,
                        }
                    }
                    Err(e) => ServerMessage::FilterResponse {
                        action: control.action,
                        status: Status::Error,
                        error: Some(e.to_string()),
                    },
                };
                self.to_client(reply).await
            }
        }
    }

    async fn send_tx_audio(
        &self,
        encoder: &mut TxEncoder,
        sequence: &mut TxSequence,
        pcm: &[u8],
        ptt: &Ptt,
    ) -> Result<(), Exit> {
        let encoded = encoder.encode(pcm);
        if encoded.is_empty() {
            tracing::trace!(session_id = %self.id, bytes = pcm.len(), "tx capture too short");
            return Ok(());
        }
        for frame in &encoded.frames {
            let payload = audio_payload(
                sequence.next(),
                self.cfg.audio.mode,
                encoded.frame_size,
                frame,
            );
            self.to_radio(codec::encode(&payload)).await?;
            self.stats.incr(Counter::TxFramesSent);
        }
        tracing::trace!(
            session_id = %self.id,
            frames = encoded.timing.frame_count,
            sequence = sequence.current(),
            ptt = ptt.active,
            "tx audio sent"
        );
        Ok(())
    }

    async fn radio_loop(
        &self,
        mut reader: OwnedReadHalf,
        audio: watch::Receiver<SessionAudioState>,
    ) -> Exit {
        let mut buf = vec![0u8; READ_CHUNK];
        let mut frames = FrameBuffer::new();
        let mut decoder = RxDecoder::new(self.cfg.audio.output_sample_rate);
        let mut pan = Panadapter::new(&self.cfg.panadapter);
        let read_timeout = Duration::from_secs(self.cfg.radio.read_timeout_secs);

        loop {
            let n = match tokio::time::timeout(read_timeout, reader.read(&mut buf)).await {
                Err(_) => {
                    tracing::debug!(session_id = %self.id, "radio read timeout");
                    continue;
                }
                Ok(Ok(0)) => return Exit::RadioClosed,
                Ok(Ok(n)) => n,
                Ok(Err(e)) => return Exit::RadioIo(e),
            };
            frames.extend(&buf[..n]);

            while let Some(next) = frames.next_packet() {
                let result = match next {
                    Ok(packet) => {
                        self.dispatch(packet, &mut decoder, &mut pan, &audio)
                            .await
                    }
                    Err(e) => {
                        self.stats.incr(Counter::FramingErrors);
                        tracing::debug!(session_id = %self.id, error = %e, "dropped malformed radio frame");
                        Ok(())
                    }
                };
                if let Err(exit) = result {
                    return exit;
                }
            }
        }
    }

    async fn dispatch(
        &self,
        packet: Packet,
        decoder: &mut RxDecoder,
        pan: &mut Panadapter,
        audio: &watch::Receiver<SessionAudioState>,
    ) -> Result<(), Exit> {
        match packet.kind {
            PayloadType::Cat => {
                self.stats.incr(Counter::CatPackets);
                let text = packet.cat_text();
                let msg = self.radio_cat(&text, pan);
                self.to_client(msg).await?;
            }
            PayloadType::Audio => {
                self.stats.incr(Counter::AudioPackets);
                let state = *audio.borrow();
                let pcm = decoder.decode(&packet.payload, &state);
                if pcm.is_empty() {
                    self.stats.incr(Counter::AudioDecodeDrops);
                } else {
                    self.to_client(Outbound::Binary(pcm)).await?;
                }
            }
            PayloadType::Pan => {
                self.stats.incr(Counter::PanPackets);
                match pan.process_spectrum_packet(&packet.payload) {
                    Ok(Some(frame)) => {
                        self.to_client(ServerMessage::SpectrumData(frame)).await?;
                        self.stats.incr(Counter::SpectrumFramesSent);
                    }
                    Ok(None) => {}
                    Err(e) => {
                        self.stats.incr(Counter::SpectrumParseErrors);
                        tracing::debug!(session_id = %self.id, error = %e, "spectrum packet dropped");
                    }
                }
            }
            PayloadType::MiniPan => self.stats.incr(Counter::MiniPanPackets),
            PayloadType::Unknown(kind) => {
                self.stats.incr(Counter::UnknownPackets);
                tracing::debug!(
                    session_id = %self.id,
                    packet_type = kind,
                    bytes = packet.payload.len(),
                    "unknown radio packet"
                );
            }
        }
        self.flush_panadapter(pan).await
    }

    /// Records and classifies a CAT packet from the radio. Updates from every
    /// command in the packet are merged; the response type follows the first.
    fn radio_cat(&self, text: &str, pan: &mut Panadapter) -> ServerMessage {
        pan.apply_cat(text);

        let mut history = self.history();
        let mut updates = Map::new();
        let mut response_type = None;
        for cmd in text
            .split_inclusive(';')
            .map(str::trim)
            .filter(|c| !c.is_empty())
        {
            history.record(cmd, Direction::Received);
            let report = history.handle_response(cmd);
            response_type.get_or_insert(report.kind);
            updates.extend(report.updates);
        }

        ServerMessage::Cat {
            text: text.to_string(),
            updates,
            response_type: response_type.unwrap_or(ResponseKind::Unknown),
        }
    }

    async fn flush_panadapter(&self, pan: &mut Panadapter) -> Result<(), Exit> {
        if let Some(b) = pan.take_pending_boundaries() {
            if b.span > 0 && b.center_frequency > 0 {
                self.to_client(ServerMessage::BoundaryUpdate(b)).await?;
            }
        }
        for (vfo, filter_data) in pan.take_filter_updates() {
            self.to_client(ServerMessage::FilterUpdate { vfo, filter_data })
                .await?;
        }
        Ok(())
    }

    async fn keepalive_loop(&self) -> Exit {
        let period = Duration::from_secs(self.cfg.radio.keepalive_interval_secs.max(1));
        let mut tick = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tick.tick().await;
            if let Err(exit) = self.to_radio(codec::encode_cat(PING)).await {
                return exit;
            }
            tracing::trace!(session_id = %self.id, "keepalive sent");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ptt_tracks_hold_time() {
        let mut ptt = Ptt::default();
        assert!(ptt.release().is_none());
        ptt.press();
        assert!(ptt.active);
        assert!(ptt.release().is_some());
        assert!(!ptt.active);
    }

    #[test]
    fn radio_cat_merges_updates_and_classifies_first_command() {
        let (radio, _radio_rx) = mpsc::channel(4);
        let (client, _client_rx) = mpsc::channel(4);
        let cfg = Arc::new(Config::default());
        let session = Session {
            id: "test".to_string(),
            stats: Arc::new(SessionStats::new(Arc::default())),
            history: Mutex::new(CommandHistory::default()),
            cfg,
            radio,
            client,
        };
        let mut pan = Panadapter::default();

        let ServerMessage::Cat {
            updates,
            response_type,
            ..
        } = session.radio_cat("FA00014060000;#SPN60000;", &mut pan)
        else {
            panic!("expected cat message");
        };
        assert_eq!(response_type, ResponseKind::AiUpdate);
        assert!(!updates.is_empty());
        assert_eq!(pan.span(), 60_000);
        assert_eq!(session.history().len(), 2);
    }
}
