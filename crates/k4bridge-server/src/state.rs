use axum::{extract::State, Json};
use dashmap::DashMap;
use k4bridge_core::{cat::format::MODE_CODES, config::Config, util::unix_time};
use serde_json::{json, Map, Value};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    CatPackets,
    AudioPackets,
    PanPackets,
    MiniPanPackets,
    UnknownPackets,
    FramingErrors,
    AudioDecodeDrops,
    SpectrumFramesSent,
    SpectrumParseErrors,
    TxFramesSent,
    CatRejected,
}

const COUNTERS: usize = 11;

impl Counter {
    pub const ALL: [Counter; COUNTERS] = [
        Counter::CatPackets,
        Counter::AudioPackets,
        Counter::PanPackets,
        Counter::MiniPanPackets,
        Counter::UnknownPackets,
        Counter::FramingErrors,
        Counter::AudioDecodeDrops,
        Counter::SpectrumFramesSent,
        Counter::SpectrumParseErrors,
        Counter::TxFramesSent,
        Counter::CatRejected,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Counter::CatPackets => "cat_packets_received",
            Counter::AudioPackets => "audio_packets_received",
            Counter::PanPackets => "pan_packets_received",
            Counter::MiniPanPackets => "mini_pan_packets_received",
            Counter::UnknownPackets => "unknown_packets_received",
            Counter::FramingErrors => "framing_errors",
            Counter::AudioDecodeDrops => "audio_decode_drops",
            Counter::SpectrumFramesSent => "spectrum_data_sent",
            Counter::SpectrumParseErrors => "spectrum_parse_errors",
            Counter::TxFramesSent => "tx_frames_sent",
            Counter::CatRejected => "cat_rejected",
        }
    }
}

#[derive(Debug, Default)]
pub struct PacketStats {
    counts: [AtomicU64; COUNTERS],
}

impl PacketStats {
    pub fn incr(&self, c: Counter) {
        self.counts[c as usize].fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self, c: Counter) -> u64 {
        self.counts[c as usize].load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> Map<String, Value> {
        let mut out = Map::new();
        for c in Counter::ALL {
            out.insert(c.name().to_string(), Value::from(self.get(c)));
        }
        out.insert("last_updated".to_string(), Value::from(unix_time()));
        out
    }
}

/// Session counters that also feed the process totals.
#[derive(Debug)]
pub struct SessionStats {
    local: PacketStats,
    global: Arc<PacketStats>,
}

impl SessionStats {
    pub fn new(global: Arc<PacketStats>) -> Self {
        Self {
            local: PacketStats::default(),
            global,
        }
    }

    pub fn incr(&self, c: Counter) {
        self.local.incr(c);
        self.global.incr(c);
    }

    pub fn local(&self) -> &PacketStats {
        &self.local
    }
}

#[derive(Debug)]
pub struct SessionEntry {
    pub peer: SocketAddr,
    pub started: chrono::DateTime<chrono::Utc>,
    pub stats: Arc<SessionStats>,
}

pub struct AppState {
    pub cfg: Arc<Config>,
    pub html_root: PathBuf,
    pub sessions: DashMap<String, SessionEntry>,
    pub stats: Arc<PacketStats>,
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(cfg: Config) -> Self {
        let html_root = PathBuf::from(&cfg.server.html_root);
        Self {
            cfg: Arc::new(cfg),
            html_root,
            sessions: DashMap::new(),
            stats: Arc::new(PacketStats::default()),
            shutdown: CancellationToken::new(),
        }
    }

    /// Registers a session. The entry is removed when the guard drops.
    pub fn register_session(
        self: &Arc<Self>,
        id: &str,
        peer: SocketAddr,
    ) -> (SessionGuard, Arc<SessionStats>) {
        let stats = Arc::new(SessionStats::new(self.stats.clone()));
        self.sessions.insert(
            id.to_string(),
            SessionEntry {
                peer,
                started: chrono::Utc::now(),
                stats: stats.clone(),
            },
        );
        (
            SessionGuard {
                state: self.clone(),
                id: id.to_string(),
            },
            stats,
        )
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }
}

pub struct SessionGuard {
    state: Arc<AppState>,
    id: String,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.state.sessions.remove(&self.id);
    }
}

pub async fn panadapter_config(State(state): State<Arc<AppState>>) -> Json<Value> {
    let p = &state.cfg.panadapter;
    Json(json!({
        "DEFAULT_CENTER_FREQ": p.center_frequency,
        "DEFAULT_SPAN": p.span,
        "DEFAULT_REF_LEVEL": p.reference_level,
        "DEFAULT_SCALE": p.scale,
        "DEFAULT_NOISE_FLOOR": p.noise_floor,
        "MAX_WATERFALL_LINES": p.max_waterfall_lines,
        "WATERFALL_HISTORY_SIZE": p.waterfall_history_size,
        "DEFAULT_WATERFALL_HEIGHT": p.waterfall_height,
        "DEFAULT_SPECTRUM_AVERAGING": p.spectrum_averaging,
        "DEFAULT_WATERFALL_AVERAGING": p.waterfall_averaging,
    }))
}

pub async fn audio_config(State(state): State<Arc<AppState>>) -> Json<Value> {
    let a = &state.cfg.audio;
    Json(json!({
        "INPUT_SAMPLE_RATE": a.input_sample_rate,
        "OUTPUT_SAMPLE_RATE": a.output_sample_rate,
        "K4_FRAME_SIZE": a.rx_frame_size,
        "K4_TX_FRAME_SIZE": a.tx_frame_size,
        "K4_RX_FRAME_SIZE": a.rx_frame_size,
        "WORKLET_FRAME_SIZE": a.worklet_buffer_size,
        "DEFAULT_MODE": a.mode,
        "DEFAULT_MIC_GAIN": a.mic_gain,
        "K4_ATTENUATION_FACTOR": a.attenuation_factor,
        "DEFAULT_BUFFER_SIZE": a.buffer_size,
        "DEFAULT_MASTER_VOLUME": a.master_volume,
    }))
}

pub async fn all_config(State(state): State<Arc<AppState>>) -> Json<Value> {
    let cfg = &state.cfg;
    let modes: Map<String, Value> = MODE_CODES
        .iter()
        .map(|(name, code)| (code.to_string(), Value::from(*name)))
        .collect();
    Json(json!({
        "audio": {
            "mic_gain": cfg.audio.mic_gain,
            "input_sample_rate": cfg.audio.input_sample_rate,
            "output_sample_rate": cfg.audio.output_sample_rate,
            "frame_size": cfg.audio.rx_frame_size,
            "tx_frame_size": cfg.audio.tx_frame_size,
            "mode": cfg.audio.mode,
            "routing": cfg.audio.routing,
            "volume": {
                "default_main": cfg.audio.main_volume,
                "default_sub": cfg.audio.sub_volume,
                "default_master": cfg.audio.master_volume,
            },
        },
        "network": {
            "k4_host": cfg.radio.host,
            "k4_port": cfg.radio.port,
            "web_port": cfg.server.port,
            "keepalive_interval": cfg.radio.keepalive_interval_secs,
        },
        "panadapter": {
            "center_freq": cfg.panadapter.center_frequency,
            "span": cfg.panadapter.span,
            "ref_level": cfg.panadapter.reference_level,
            "scale": cfg.panadapter.scale,
            "noise_floor": cfg.panadapter.noise_floor,
            "waterfall_height": cfg.panadapter.waterfall_height,
            "waterfall_lines": cfg.panadapter.max_waterfall_lines,
            "spectrum_averaging": cfg.panadapter.spectrum_averaging,
            "waterfall_averaging": cfg.panadapter.waterfall_averaging,
        },
        "modes": { "cat_mode_map": modes },
        "version": crate::build_info::version(),
        "timestamp": chrono::Utc::now().timestamp(),
    }))
}

pub async fn stats(State(state): State<Arc<AppState>>) -> Json<Value> {
    let sessions: Map<String, Value> = state
        .sessions
        .iter()
        .map(|e| {
            (
                e.key().clone(),
                json!({
                    "peer": e.peer.to_string(),
                    "started": e.started.to_rfc3339(),
                    "stats": e.stats.local().snapshot(),
                }),
            )
        })
        .collect();
    Json(json!({
        "active_sessions": state.active_sessions(),
        "totals": state.stats.snapshot(),
        "sessions": sessions,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_counters_feed_totals() {
        let global = Arc::new(PacketStats::default());
        let a = SessionStats::new(global.clone());
        let b = SessionStats::new(global.clone());
        a.incr(Counter::CatPackets);
        b.incr(Counter::CatPackets);
        b.incr(Counter::FramingErrors);
        assert_eq!(a.local().get(Counter::CatPackets), 1);
        assert_eq!(global.get(Counter::CatPackets), 2);
        assert_eq!(global.snapshot()["framing_errors"], 1);
    }

    #[test]
    fn guard_unregisters_session() {
        let state = Arc::new(AppState::new(Config::default()));
        let peer: SocketAddr = "127.0.0.1:5000".parse().unwrap();
        let (guard, _stats) = state.register_session("abc", peer);
        assert_eq!(state.active_sessions(), 1);
        drop(guard);
        assert_eq!(state.active_sessions(), 0);
    }
}
