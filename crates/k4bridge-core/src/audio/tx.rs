//! Browser microphone to radio: 48 kHz mono f32 into stereo Opus frames.

use super::rx::AudioHeader;
use super::CHANNELS;
use crate::config;
use crate::dsp::{level, resample, sample};
use crate::error::DecodeError;
use bytes::{Bytes, BytesMut};
use serde::Serialize;

/// Upper bound for one encoded Opus packet.
const MAX_OPUS_PACKET: usize = 4000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FrameTiming {
    pub frame_duration_ms: u32,
    pub total_duration_ms: u32,
    pub frame_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedTx {
    pub frames: Vec<Bytes>,
    pub timing: FrameTiming,
    /// Samples per channel in each frame.
    pub frame_size: usize,
}

impl EncodedTx {
    fn empty(frame_duration_ms: u32, frame_size: usize) -> Self {
        Self {
            frames: Vec::new(),
            timing: FrameTiming {
                frame_duration_ms,
                total_duration_ms: 0,
                frame_count: 0,
            },
            frame_size,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Per-session TX encoder. The Opus encoder is created once and reused.
pub struct TxEncoder {
    opus: Option<opus::Encoder>,
    frame_size: usize,
    ratio: usize,
    gain: f32,
    attenuation: f32,
    frame_duration_ms: u32,
    out: Vec<u8>,
}

impl TxEncoder {
    pub fn new(cfg: &config::Audio) -> Self {
        let opus = match opus::Encoder::new(
            cfg.output_sample_rate,
            opus::Channels::Stereo,
            opus::Application::Audio,
        ) {
            Ok(e) => Some(e),
            Err(e) => {
                tracing::error!(error = ?e, sample_rate = cfg.output_sample_rate, "opus encoder init failed; TX audio disabled");
                None
            }
        };
        Self {
            opus,
            frame_size: cfg.tx_frame_size,
            ratio: cfg.downsample_ratio().max(1),
            gain: cfg.mic_gain,
            attenuation: cfg.attenuation_factor,
            frame_duration_ms: cfg.packet_interval_ms,
            out: vec![0u8; MAX_OPUS_PACKET],
        }
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Samples of capture audio consumed per call.
    pub fn input_samples(&self) -> usize {
        self.frame_size * self.ratio
    }

    /// Encodes one capture block. Short or malformed input, or a missing
    /// codec, gives an empty frame list.
    pub fn encode(&mut self, pcm: &[u8]) -> EncodedTx {
        match self.try_encode(pcm) {
            Ok(Some(frame)) => EncodedTx {
                frames: vec![frame],
                timing: FrameTiming {
                    frame_duration_ms: self.frame_duration_ms,
                    total_duration_ms: self.frame_duration_ms,
                    frame_count: 1,
                },
                frame_size: self.frame_size,
            },
            Ok(None) => EncodedTx::empty(self.frame_duration_ms, self.frame_size),
            Err(e) => {
                tracing::debug!(error = %e, bytes = pcm.len(), "tx audio dropped");
                EncodedTx::empty(self.frame_duration_ms, self.frame_size)
            }
        }
    }

    fn try_encode(&mut self, pcm: &[u8]) -> Result<Option<Bytes>, DecodeError> {
        let Some(samples) = sample::f32_le_from_bytes(pcm) else {
            return Ok(None);
        };
        let needed = self.input_samples();
        if samples.len() < needed {
            return Ok(None);
        }

        let mut mono = resample::average_decimate(&samples[..needed], self.ratio);
        resample::fit_len(&mut mono, self.frame_size);
        level::scale(&mut mono, self.gain / self.attenuation);

        let stereo = duplicate_to_stereo(&mono);
        let opus = self.opus.as_mut().ok_or(DecodeError::CodecUnavailable)?;
        let n = opus.encode_float(&stereo, &mut self.out)?;
        Ok(Some(Bytes::copy_from_slice(&self.out[..n])))
    }
}

fn duplicate_to_stereo(mono: &[f32]) -> Vec<f32> {
    let mut out = Vec::with_capacity(mono.len() * CHANNELS);
    for &s in mono {
        out.push(s);
        out.push(s);
    }
    out
}

/// Outgoing audio sequence byte, pre-incremented and wrapping at 256.
#[derive(Debug, Default, Clone, Copy)]
pub struct TxSequence(u8);

impl TxSequence {
    pub fn next(&mut self) -> u8 {
        self.0 = self.0.wrapping_add(1);
        self.0
    }

    pub fn current(&self) -> u8 {
        self.0
    }
}

/// Builds a radio audio payload: `1, 1, seq, mode, frame_size (u16 LE), 0, data`.
pub fn audio_payload(sequence: u8, mode: u8, frame_size: usize, data: &[u8]) -> Bytes {
    let mut out = BytesMut::with_capacity(super::rx::AUDIO_HEADER_LEN + data.len());
    AudioHeader {
        version: 1,
        sequence,
        mode,
        frame_size: frame_size.min(u16::MAX as usize) as u16,
        sample_rate_code: 0,
    }
    .write(&mut out);
    out.extend_from_slice(data);
    out.freeze()
}
