use crate::audio::RoutingPattern;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: Server,
    #[serde(default)]
    pub radio: Radio,
    #[serde(default)]
    pub audio: Audio,
    #[serde(default)]
    pub panadapter: Panadapter,
    #[serde(default)]
    pub session: Session,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_html_root")]
    pub html_root: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Radio {
    #[serde(default = "default_radio_host")]
    pub host: String,
    #[serde(default = "default_radio_port")]
    pub port: u16,
    #[serde(default = "default_password", skip_serializing)]
    pub password: String,
    #[serde(default = "default_init_commands")]
    pub init_commands: Vec<String>,
    #[serde(default = "default_init_command_delay_ms")]
    pub init_command_delay_ms: u64,
    #[serde(default = "default_keepalive_interval_secs")]
    pub keepalive_interval_secs: u64,
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

/// Audio path parameters. Sample rates are in Hz, frame sizes are samples
/// per channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Audio {
    #[serde(default = "default_input_sample_rate")]
    pub input_sample_rate: u32,
    #[serde(default = "default_output_sample_rate")]
    pub output_sample_rate: u32,
    #[serde(default = "default_rx_frame_size")]
    pub rx_frame_size: usize,
    #[serde(default = "default_tx_frame_size")]
    pub tx_frame_size: usize,
    #[serde(default = "default_audio_mode")]
    pub mode: u8,
    #[serde(default = "default_mic_gain")]
    pub mic_gain: f32,
    #[serde(default = "default_attenuation_factor")]
    pub attenuation_factor: f32,
    #[serde(default = "default_volume")]
    pub main_volume: f32,
    #[serde(default = "default_volume")]
    pub sub_volume: f32,
    #[serde(default)]
    pub sub_enabled: bool,
    #[serde(default = "default_routing")]
    pub routing: String,
    #[serde(default = "default_packet_interval_ms")]
    pub packet_interval_ms: u32,
    /// Browser-side playback hints, served through `/config/audio`.
    #[serde(default = "default_worklet_buffer_size")]
    pub worklet_buffer_size: usize,
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    #[serde(default = "default_master_volume")]
    pub master_volume: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Panadapter {
    #[serde(default = "default_center_frequency")]
    pub center_frequency: i64,
    #[serde(default = "default_span")]
    pub span: i64,
    #[serde(default = "default_reference_level")]
    pub reference_level: i32,
    #[serde(default = "default_scale")]
    pub scale: i32,
    #[serde(default = "default_noise_floor")]
    pub noise_floor: i32,
    #[serde(default = "default_max_waterfall_lines")]
    pub max_waterfall_lines: usize,
    #[serde(default = "default_waterfall_history_size")]
    pub waterfall_history_size: usize,
    #[serde(default = "default_waterfall_height")]
    pub waterfall_height: u32,
    #[serde(default = "default_spectrum_averaging")]
    pub spectrum_averaging: u32,
    #[serde(default = "default_waterfall_averaging")]
    pub waterfall_averaging: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    #[serde(default = "default_max_consecutive_errors")]
    pub max_consecutive_errors: u32,
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    #[serde(default = "default_recent_window_ms")]
    pub recent_window_ms: u64,
    #[serde(default = "default_outbound_queue")]
    pub outbound_queue: usize,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_html_root() -> String {
    "frontend/dist/".to_string()
}
fn default_radio_host() -> String {
    "192.168.1.10".to_string()
}
fn default_radio_port() -> u16 {
    9205
}
fn default_password() -> String {
    "tester".to_string()
}
fn default_init_commands() -> Vec<String> {
    [
        "RDY;",
        "K41;",
        "EM3;",
        "AI4;",
        "ER1;",
        "FA;",
        "FB;",
        "MD;",
        "MD$;",
        "NB;",
        "NB$;",
        "NR;",
        "NR$;",
        "SB;",
        "FP;",
        "FP$;",
        "BW;",
        "BW$;",
        "#REF;",
        "#SPN50000;",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
fn default_init_command_delay_ms() -> u64 {
    100
}
fn default_keepalive_interval_secs() -> u64 {
    2
}
fn default_read_timeout_secs() -> u64 {
    10
}
fn default_connect_timeout_secs() -> u64 {
    5
}
fn default_input_sample_rate() -> u32 {
    48_000
}
fn default_output_sample_rate() -> u32 {
    12_000
}
fn default_rx_frame_size() -> usize {
    480
}
fn default_tx_frame_size() -> usize {
    240
}
fn default_audio_mode() -> u8 {
    3
}
fn default_mic_gain() -> f32 {
    0.1
}
fn default_attenuation_factor() -> f32 {
    4.0
}
fn default_volume() -> f32 {
    1.0
}
fn default_routing() -> String {
    "a.b".to_string()
}
fn default_packet_interval_ms() -> u32 {
    20
}
fn default_worklet_buffer_size() -> usize {
    960
}
fn default_buffer_size() -> usize {
    3
}
fn default_master_volume() -> f32 {
    1.5
}
fn default_center_frequency() -> i64 {
    14_086_500
}
fn default_span() -> i64 {
    50_000
}
fn default_reference_level() -> i32 {
    -110
}
fn default_scale() -> i32 {
    70
}
fn default_noise_floor() -> i32 {
    -120
}
fn default_max_waterfall_lines() -> usize {
    200
}
fn default_waterfall_history_size() -> usize {
    50
}
fn default_waterfall_height() -> u32 {
    237
}
fn default_spectrum_averaging() -> u32 {
    4
}
fn default_waterfall_averaging() -> u32 {
    2
}
fn default_max_consecutive_errors() -> u32 {
    10
}
fn default_history_capacity() -> usize {
    100
}
fn default_recent_window_ms() -> u64 {
    2000
}
fn default_outbound_queue() -> usize {
    256
}

impl Default for Server {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            html_root: default_html_root(),
        }
    }
}

impl Default for Radio {
    fn default() -> Self {
        Self {
            host: default_radio_host(),
            port: default_radio_port(),
            password: default_password(),
            init_commands: default_init_commands(),
            init_command_delay_ms: default_init_command_delay_ms(),
            keepalive_interval_secs: default_keepalive_interval_secs(),
            read_timeout_secs: default_read_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl Default for Audio {
    fn default() -> Self {
        Self {
            input_sample_rate: default_input_sample_rate(),
            output_sample_rate: default_output_sample_rate(),
            rx_frame_size: default_rx_frame_size(),
            tx_frame_size: default_tx_frame_size(),
            mode: default_audio_mode(),
            mic_gain: default_mic_gain(),
            attenuation_factor: default_attenuation_factor(),
            main_volume: default_volume(),
            sub_volume: default_volume(),
            sub_enabled: false,
            routing: default_routing(),
            packet_interval_ms: default_packet_interval_ms(),
            worklet_buffer_size: default_worklet_buffer_size(),
            buffer_size: default_buffer_size(),
            master_volume: default_master_volume(),
        }
    }
}

impl Default for Panadapter {
    fn default() -> Self {
        Self {
            center_frequency: default_center_frequency(),
            span: default_span(),
            reference_level: default_reference_level(),
            scale: default_scale(),
            noise_floor: default_noise_floor(),
            max_waterfall_lines: default_max_waterfall_lines(),
            waterfall_history_size: default_waterfall_history_size(),
            waterfall_height: default_waterfall_height(),
            spectrum_averaging: default_spectrum_averaging(),
            waterfall_averaging: default_waterfall_averaging(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self {
            max_consecutive_errors: default_max_consecutive_errors(),
            history_capacity: default_history_capacity(),
            recent_window_ms: default_recent_window_ms(),
            outbound_queue: default_outbound_queue(),
        }
    }
}

impl Audio {
    /// Integer ratio between browser capture rate and radio rate.
    pub fn downsample_ratio(&self) -> usize {
        (self.input_sample_rate / self.output_sample_rate.max(1)) as usize
    }

    /// Capture samples consumed per TX frame.
    pub fn tx_input_samples(&self) -> usize {
        self.tx_frame_size * self.downsample_ratio()
    }

    pub fn default_routing(&self) -> RoutingPattern {
        self.routing.parse().unwrap_or_default()
    }
}

impl Radio {
    /// Init sequence with the `EM` entry following the configured audio mode.
    pub fn init_sequence(&self, audio_mode: u8) -> Vec<String> {
        self.init_commands
            .iter()
            .map(|cmd| {
                if cmd.starts_with("EM") {
                    format!("EM{audio_mode};")
                } else {
                    cmd.clone()
                }
            })
            .collect()
    }
}

pub fn load_from_file(config_json: &Path) -> anyhow::Result<Config> {
    let raw = std::fs::read_to_string(config_json)
        .with_context(|| format!("read {}", config_json.display()))?;
    let cfg: Config =
        serde_json::from_str(&raw).with_context(|| format!("parse {}", config_json.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", config_json.display()))?;
    Ok(cfg)
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.radio.host.trim().is_empty(),
            "radio.host must not be empty"
        );
        anyhow::ensure!(self.radio.port != 0, "radio.port must be > 0");
        anyhow::ensure!(
            self.radio.keepalive_interval_secs > 0,
            "radio.keepalive_interval_secs must be > 0"
        );
        anyhow::ensure!(
            self.radio.read_timeout_secs > 0,
            "radio.read_timeout_secs must be > 0"
        );

        let a = &self.audio;
        anyhow::ensure!(
            a.output_sample_rate > 0 && a.input_sample_rate > 0,
            "audio sample rates must be > 0"
        );
        anyhow::ensure!(
            a.input_sample_rate % a.output_sample_rate == 0,
            "audio.input_sample_rate ({}) must be an integer multiple of audio.output_sample_rate ({})",
            a.input_sample_rate,
            a.output_sample_rate
        );
        anyhow::ensure!(a.rx_frame_size > 0, "audio.rx_frame_size must be > 0");
        anyhow::ensure!(a.tx_frame_size > 0, "audio.tx_frame_size must be > 0");
        anyhow::ensure!(
            a.attenuation_factor > 0.0,
            "audio.attenuation_factor must be > 0"
        );
        if a.mode > 3 {
            anyhow::bail!("audio.mode {} is not supported (expected 0..=3)", a.mode);
        }
        if a.routing.parse::<RoutingPattern>().is_err() {
            anyhow::bail!("audio.routing {:?} is not a known routing pattern", a.routing);
        }

        let p = &self.panadapter;
        anyhow::ensure!(p.span > 0, "panadapter.span must be > 0");
        anyhow::ensure!(
            p.max_waterfall_lines > 0,
            "panadapter.max_waterfall_lines must be > 0"
        );
        anyhow::ensure!(
            p.waterfall_history_size <= p.max_waterfall_lines,
            "panadapter.waterfall_history_size must not exceed panadapter.max_waterfall_lines"
        );

        anyhow::ensure!(
            self.session.history_capacity > 0,
            "session.history_capacity must be > 0"
        );
        anyhow::ensure!(
            self.session.outbound_queue > 0,
            "session.outbound_queue must be > 0"
        );
        Ok(())
    }
}
