//! Radio to browser audio: mode 0..3 payloads into interleaved LE f32 stereo.

use super::{
    mix_receivers, SessionAudioState, CHANNELS, MODE_OPUS_16, MODE_OPUS_FLOAT, MODE_RAW_16,
    MODE_RAW_32,
};
use crate::codec::PayloadType;
use crate::dsp::{level, sample};
use crate::error::DecodeError;
use bytes::{BufMut, BytesMut};

pub const AUDIO_HEADER_LEN: usize = 7;
const MIN_AUDIO_PAYLOAD: usize = AUDIO_HEADER_LEN + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioHeader {
    pub version: u8,
    pub sequence: u8,
    pub mode: u8,
    /// Samples per channel.
    pub frame_size: u16,
    pub sample_rate_code: u8,
}

impl AudioHeader {
    pub fn parse(payload: &[u8]) -> Result<Self, DecodeError> {
        if payload.len() < MIN_AUDIO_PAYLOAD {
            return Err(DecodeError::TooShort(payload.len()));
        }
        if payload[0] != PayloadType::Audio.as_byte() {
            return Err(DecodeError::WrongPacketType(payload[0]));
        }
        Ok(Self {
            version: payload[1],
            sequence: payload[2],
            mode: payload[3],
            frame_size: u16::from_le_bytes([payload[4], payload[5]]),
            sample_rate_code: payload[6],
        })
    }

    pub fn write(&self, out: &mut BytesMut) {
        out.put_u8(PayloadType::Audio.as_byte());
        out.put_u8(self.version);
        out.put_u8(self.sequence);
        out.put_u8(self.mode);
        out.put_u16_le(self.frame_size);
        out.put_u8(self.sample_rate_code);
    }
}

/// Per-session RX decoder. Owns its Opus state.
pub struct RxDecoder {
    opus: Option<opus::Decoder>,
    scratch_i16: Vec<i16>,
    scratch_f32: Vec<f32>,
}

impl RxDecoder {
    pub fn new(sample_rate: u32) -> Self {
        let opus = match opus::Decoder::new(sample_rate, opus::Channels::Stereo) {
            Ok(d) => Some(d),
            Err(e) => {
                tracing::error!(error = ?e, sample_rate, "opus decoder init failed; compressed RX audio disabled");
                None
            }
        };
        Self {
            opus,
            scratch_i16: Vec::new(),
            scratch_f32: Vec::new(),
        }
    }

    /// Decodes one audio payload into LE f32 bytes. Failures yield empty bytes.
    pub fn decode(&mut self, payload: &[u8], state: &SessionAudioState) -> Vec<u8> {
        match self.try_decode(payload, state) {
            Ok(samples) => sample::f32_to_le_bytes(&samples),
            Err(e) => {
                tracing::debug!(error = %e, bytes = payload.len(), "rx audio dropped");
                Vec::new()
            }
        }
    }

    pub fn try_decode(
        &mut self,
        payload: &[u8],
        state: &SessionAudioState,
    ) -> Result<Vec<f32>, DecodeError> {
        let header = AudioHeader::parse(payload)?;
        let data = &payload[AUDIO_HEADER_LEN..];
        let frame_size = header.frame_size as usize;

        let mut samples = match header.mode {
            MODE_RAW_32 => {
                if data.len() % 8 != 0 {
                    return Err(DecodeError::InvalidPcmLength {
                        bits: 32,
                        len: data.len(),
                    });
                }
                let mut out = Vec::new();
                sample::i32_le_to_f32(data, &mut out);
                out
            }
            MODE_RAW_16 => {
                if data.len() % 4 != 0 {
                    return Err(DecodeError::InvalidPcmLength {
                        bits: 16,
                        len: data.len(),
                    });
                }
                let mut out = Vec::new();
                sample::i16_le_to_f32(data, &mut out);
                out
            }
            MODE_OPUS_16 => self.decode_opus_i16(data, frame_size)?,
            MODE_OPUS_FLOAT => {
                let decoded = self.decode_opus_float(data, frame_size)?;
                mix_receivers(decoded, frame_size, state)
            }
            other => return Err(DecodeError::UnsupportedMode(other)),
        };

        if samples.is_empty() {
            return Err(DecodeError::Empty);
        }
        level::limit_peak(&mut samples);
        level::pad_to_even(&mut samples);
        Ok(samples)
    }

    fn decode_opus_i16(&mut self, data: &[u8], frame_size: usize) -> Result<Vec<f32>, DecodeError> {
        if frame_size == 0 {
            return Err(DecodeError::ZeroFrameSize);
        }
        let opus = self.opus.as_mut().ok_or(DecodeError::CodecUnavailable)?;
        // The radio reports samples per channel; the decode window is doubled.
        let capacity = frame_size * 2 * CHANNELS;
        self.scratch_i16.resize(capacity, 0);
        let per_channel = opus.decode(data, &mut self.scratch_i16[..], false)?;
        let decoded = &self.scratch_i16[..(per_channel * CHANNELS).min(capacity)];
        Ok(decoded
            .iter()
            .map(|&s| s as f32 / sample::I16_MAX)
            .collect())
    }

    fn decode_opus_float(&mut self, data: &[u8], frame_size: usize) -> Result<&[f32], DecodeError> {
        if frame_size == 0 {
            return Err(DecodeError::ZeroFrameSize);
        }
        let opus = self.opus.as_mut().ok_or(DecodeError::CodecUnavailable)?;
        let capacity = frame_size * CHANNELS;
        self.scratch_f32.resize(capacity, 0.0);
        let per_channel = opus.decode_float(data, &mut self.scratch_f32[..], false)?;
        Ok(&self.scratch_f32[..(per_channel * CHANNELS).min(capacity)])
    }
}
