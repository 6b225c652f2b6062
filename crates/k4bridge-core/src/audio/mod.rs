pub mod rx;
pub mod tx;

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

pub use rx::{AudioHeader, RxDecoder};
pub use tx::{EncodedTx, FrameTiming, TxEncoder, TxSequence};

pub const MODE_RAW_32: u8 = 0;
pub const MODE_RAW_16: u8 = 1;
pub const MODE_OPUS_16: u8 = 2;
pub const MODE_OPUS_FLOAT: u8 = 3;

pub const CHANNELS: usize = 2;

/// Fixed gain the radio's float Opus stream needs on top of the user volume.
pub const RX_FLOAT_GAIN: f32 = 32.0;

pub const MAX_VOLUME: f32 = 2.0;

/// Which receiver signal feeds one output channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// `a`: main receiver (VFO A).
    Main,
    /// `b`: sub receiver (VFO B).
    Sub,
    /// `ab`: `(main + sub) / 2`.
    Mix,
    /// `-a`: inverted main, right channel only.
    InvertedMain,
}

impl Source {
    fn token(self) -> &'static str {
        match self {
            Source::Main => "a",
            Source::Sub => "b",
            Source::Mix => "ab",
            Source::InvertedMain => "-a",
        }
    }

    #[inline]
    fn pick(self, main: f32, sub: f32) -> f32 {
        match self {
            Source::Main => main,
            Source::Sub => sub,
            Source::Mix => (main + sub) / 2.0,
            Source::InvertedMain => -main,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingPattern {
    pub left: Source,
    pub right: Source,
}

impl RoutingPattern {
    pub const fn new(left: Source, right: Source) -> Self {
        Self { left, right }
    }

    pub const ALL: [RoutingPattern; 10] = [
        RoutingPattern::new(Source::Main, Source::Sub),
        RoutingPattern::new(Source::Mix, Source::Mix),
        RoutingPattern::new(Source::Main, Source::InvertedMain),
        RoutingPattern::new(Source::Main, Source::Mix),
        RoutingPattern::new(Source::Mix, Source::Sub),
        RoutingPattern::new(Source::Mix, Source::Main),
        RoutingPattern::new(Source::Sub, Source::Mix),
        RoutingPattern::new(Source::Sub, Source::Sub),
        RoutingPattern::new(Source::Sub, Source::Main),
        RoutingPattern::new(Source::Main, Source::Main),
    ];

    #[inline]
    pub fn route(self, main: f32, sub: f32) -> (f32, f32) {
        (self.left.pick(main, sub), self.right.pick(main, sub))
    }
}

impl Default for RoutingPattern {
    fn default() -> Self {
        RoutingPattern::new(Source::Main, Source::Sub)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown audio routing {0:?}")]
pub struct UnknownRouting(pub String);

impl FromStr for RoutingPattern {
    type Err = UnknownRouting;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().to_ascii_lowercase();
        RoutingPattern::ALL
            .iter()
            .copied()
            .find(|p| p.to_string() == trimmed)
            .ok_or_else(|| UnknownRouting(s.to_string()))
    }
}

impl fmt::Display for RoutingPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.left.token(), self.right.token())
    }
}

impl Serialize for RoutingPattern {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Per-session RX volume and routing.
///
/// Written only by the client-message loop, read by every RX decode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionAudioState {
    pub main_volume: f32,
    pub sub_volume: f32,
    pub sub_enabled: bool,
    pub routing: RoutingPattern,
    default_routing: RoutingPattern,
}

impl Default for SessionAudioState {
    fn default() -> Self {
        Self::new(1.0, 1.0, false, RoutingPattern::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AudioSettings {
    pub main_volume: f32,
    pub sub_volume: f32,
    pub sub_enabled: bool,
    pub audio_routing: RoutingPattern,
}

impl SessionAudioState {
    pub fn new(main_volume: f32, sub_volume: f32, sub_enabled: bool, routing: RoutingPattern) -> Self {
        Self {
            main_volume: clamp_volume(main_volume),
            sub_volume: clamp_volume(sub_volume),
            sub_enabled,
            routing,
            default_routing: routing,
        }
    }

    pub fn from_config(cfg: &crate::config::Audio) -> Self {
        Self::new(
            cfg.main_volume,
            cfg.sub_volume,
            cfg.sub_enabled,
            cfg.default_routing(),
        )
    }

    pub fn set_main_volume(&mut self, v: f32) {
        self.main_volume = clamp_volume(v);
    }

    pub fn set_sub_volume(&mut self, v: f32) {
        self.sub_volume = clamp_volume(v);
    }

    pub fn set_sub_enabled(&mut self, enabled: bool) {
        self.sub_enabled = enabled;
    }

    /// Applies a routing token. Unknown tokens reset to the configured default
    /// and return `false`.
    pub fn set_routing(&mut self, token: &str) -> bool {
        match token.parse::<RoutingPattern>() {
            Ok(p) => {
                self.routing = p;
                true
            }
            Err(_) => {
                tracing::warn!(routing = token, fallback = %self.default_routing, "unknown audio routing");
                self.routing = self.default_routing;
                false
            }
        }
    }

    pub fn settings(&self) -> AudioSettings {
        AudioSettings {
            main_volume: self.main_volume,
            sub_volume: self.sub_volume,
            sub_enabled: self.sub_enabled,
            audio_routing: self.routing,
        }
    }
}

fn clamp_volume(v: f32) -> f32 {
    if v.is_nan() {
        return 0.0;
    }
    v.clamp(0.0, MAX_VOLUME)
}

/// Splits interleaved main/sub float samples, applies volume, sub fallback
/// and routing, and returns interleaved L/R of exactly `frame_size` pairs.
/// An empty decode stays empty.
pub fn mix_receivers(interleaved: &[f32], frame_size: usize, state: &SessionAudioState) -> Vec<f32> {
    let main_gain = state.main_volume * RX_FLOAT_GAIN;
    let sub_gain = state.sub_volume * RX_FLOAT_GAIN;

    let pairs = interleaved.chunks_exact(CHANNELS);
    let mut left = Vec::with_capacity(pairs.len());
    let mut right = Vec::with_capacity(pairs.len());
    for pair in pairs {
        let main = pair[0] * main_gain;
        let sub = if state.sub_enabled {
            pair[1] * sub_gain
        } else {
            main
        };
        let (l, r) = state.routing.route(main, sub);
        left.push(l);
        right.push(r);
    }
    if left.is_empty() {
        return Vec::new();
    }

    let left = crate::dsp::resample::reconcile_len(left, frame_size);
    let right = crate::dsp::resample::reconcile_len(right, frame_size);

    let mut out = Vec::with_capacity(frame_size * CHANNELS);
    for (l, r) in left.into_iter().zip(right) {
        out.push(l);
        out.push(r);
    }
    out
}
