//! Radio link envelope: `START || len (u32 BE) || payload || END`.
//!
//! The first three payload bytes are always `type, version, sequence`. CAT
//! payloads use `00 00 00` followed by ASCII command text.

use crate::error::FrameError;
use bytes::{Buf, BufMut, Bytes, BytesMut};

pub const START_MARKER: [u8; 4] = [0xFE, 0xFD, 0xFC, 0xFB];
pub const END_MARKER: [u8; 4] = [0xFB, 0xFC, 0xFD, 0xFE];

const MARKER_LEN: usize = 4;
const HEADER_LEN: usize = MARKER_LEN + 4;

/// Largest payload the deframer will wait for. A declared length above this
/// is treated as corruption instead of an incomplete read.
pub const MAX_PAYLOAD_LEN: usize = 1 << 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadType {
    Cat,
    Audio,
    Pan,
    MiniPan,
    Unknown(u8),
}

impl PayloadType {
    pub fn from_byte(b: u8) -> Self {
        match b {
            0 => PayloadType::Cat,
            1 => PayloadType::Audio,
            2 => PayloadType::Pan,
            3 => PayloadType::MiniPan,
            other => PayloadType::Unknown(other),
        }
    }

    pub fn as_byte(self) -> u8 {
        match self {
            PayloadType::Cat => 0,
            PayloadType::Audio => 1,
            PayloadType::Pan => 2,
            PayloadType::MiniPan => 3,
            PayloadType::Unknown(b) => b,
        }
    }
}

/// One deframed (or to-be-framed) payload. `payload` holds the full payload
/// including the `type, version, sequence` prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub kind: PayloadType,
    pub version: u8,
    pub sequence: u8,
    pub payload: Bytes,
}

impl Packet {
    pub fn new(kind: PayloadType, version: u8, sequence: u8, body: &[u8]) -> Self {
        let mut buf = BytesMut::with_capacity(3 + body.len());
        buf.put_u8(kind.as_byte());
        buf.put_u8(version);
        buf.put_u8(sequence);
        buf.put_slice(body);
        Self {
            kind,
            version,
            sequence,
            payload: buf.freeze(),
        }
    }

    pub fn cat(text: &str) -> Self {
        Self::new(PayloadType::Cat, 0, 0, text.as_bytes())
    }

    pub fn from_payload(payload: Bytes) -> Result<Self, FrameError> {
        let Some(&kind) = payload.first() else {
            return Err(FrameError::EmptyPayload);
        };
        Ok(Self {
            kind: PayloadType::from_byte(kind),
            version: payload.get(1).copied().unwrap_or(0),
            sequence: payload.get(2).copied().unwrap_or(0),
            payload,
        })
    }

    /// Payload bytes after the three-byte prefix.
    pub fn body(&self) -> &[u8] {
        self.payload.get(3..).unwrap_or_default()
    }

    /// CAT text carried by this packet (lossy for non-ASCII bytes).
    pub fn cat_text(&self) -> String {
        String::from_utf8_lossy(self.body()).into_owned()
    }

    pub fn encode(&self) -> Bytes {
        encode(&self.payload)
    }
}

pub fn encode(payload: &[u8]) -> Bytes {
    let mut out = BytesMut::with_capacity(HEADER_LEN + payload.len() + MARKER_LEN);
    out.put_slice(&START_MARKER);
    out.put_u32(payload.len() as u32);
    out.put_slice(payload);
    out.put_slice(&END_MARKER);
    out.freeze()
}

pub fn encode_cat(text: &str) -> Bytes {
    Packet::cat(text).encode()
}

/// Extracts the first complete frame from `buf`.
///
/// Returns the payload and the number of bytes consumed (including any
/// garbage before the start marker). `MissingEndMarker` means the frame is
/// not complete yet; `MissingStartMarker` means no frame begins in `buf`.
pub fn decode(buf: &[u8]) -> Result<(Bytes, usize), FrameError> {
    let start = find(buf, &START_MARKER).ok_or(FrameError::MissingStartMarker)?;
    let body = start + HEADER_LEN;
    if buf.len() < body {
        return Err(FrameError::MissingEndMarker);
    }
    let declared = u32::from_be_bytes([
        buf[start + 4],
        buf[start + 5],
        buf[start + 6],
        buf[start + 7],
    ]) as usize;

    if declared <= MAX_PAYLOAD_LEN {
        let end = body + declared;
        if buf.len() < end + MARKER_LEN {
            return Err(FrameError::MissingEndMarker);
        }
        if buf[end..end + MARKER_LEN] == END_MARKER {
            let payload = Bytes::copy_from_slice(&buf[body..end]);
            return Ok((payload, end + MARKER_LEN));
        }
    }

    match find(&buf[body..], &END_MARKER) {
        Some(actual) => Err(FrameError::LengthMismatch { declared, actual }),
        None => Err(FrameError::MissingEndMarker),
    }
}

/// Growing receive buffer for partial reads from the radio link.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    buf: BytesMut,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(8192),
        }
    }

    pub fn extend(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Pops the next complete packet. `None` means more bytes are needed.
    ///
    /// Framing errors drop the bad span and are reported once; the caller
    /// keeps calling until `None`.
    pub fn next_packet(&mut self) -> Option<Result<Packet, FrameError>> {
        match decode(&self.buf) {
            Ok((payload, consumed)) => {
                self.buf.advance(consumed);
                Some(Packet::from_payload(payload))
            }
            Err(FrameError::MissingEndMarker) => {
                // Garbage ahead of a pending frame can go.
                if let Some(start) = find(&self.buf, &START_MARKER) {
                    self.buf.advance(start);
                }
                None
            }
            Err(FrameError::MissingStartMarker) => {
                // Keep a tail that could be the first bytes of a start marker.
                let keep = MARKER_LEN - 1;
                if self.buf.len() > keep {
                    let drop = self.buf.len() - keep;
                    self.buf.advance(drop);
                    return Some(Err(FrameError::MissingStartMarker));
                }
                None
            }
            Err(e @ FrameError::LengthMismatch { actual, .. }) => {
                let start = find(&self.buf, &START_MARKER).unwrap_or(0);
                self.buf.advance(start + HEADER_LEN + actual + MARKER_LEN);
                Some(Err(e))
            }
            Err(e @ FrameError::EmptyPayload) => Some(Err(e)),
        }
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cat_frame_layout() {
        let frame = encode_cat("FA;");
        assert_eq!(&frame[..4], &START_MARKER);
        assert_eq!(&frame[4..8], &6u32.to_be_bytes());
        assert_eq!(&frame[8..11], &[0, 0, 0]);
        assert_eq!(&frame[11..14], b"FA;");
        assert_eq!(&frame[14..], &END_MARKER);
    }

    #[test]
    fn partial_frame_waits_for_more_bytes() {
        let frame = encode_cat("PING;");
        let mut buf = FrameBuffer::new();
        buf.extend(&frame[..frame.len() - 2]);
        assert!(buf.next_packet().is_none());
        assert_eq!(buf.len(), frame.len() - 2, "incomplete tail must be kept");

        buf.extend(&frame[frame.len() - 2..]);
        let pkt = buf.next_packet().unwrap().unwrap();
        assert_eq!(pkt.kind, PayloadType::Cat);
        assert_eq!(pkt.cat_text(), "PING;");
        assert!(buf.is_empty());
    }

    #[test]
    fn two_frames_in_one_read_keep_order() {
        let mut buf = FrameBuffer::new();
        buf.extend(&encode_cat("FA00014060000;"));
        buf.extend(&encode_cat("FB00007040000;"));
        let a = buf.next_packet().unwrap().unwrap();
        let b = buf.next_packet().unwrap().unwrap();
        assert_eq!(a.cat_text(), "FA00014060000;");
        assert_eq!(b.cat_text(), "FB00007040000;");
        assert!(buf.next_packet().is_none());
    }

    #[test]
    fn leading_garbage_is_skipped() {
        let mut buf = FrameBuffer::new();
        buf.extend(&[1, 2, 3, 4, 5]);
        buf.extend(&encode_cat("RDY;"));
        let pkt = buf.next_packet().unwrap().unwrap();
        assert_eq!(pkt.cat_text(), "RDY;");
    }

    #[test]
    fn length_mismatch_is_reported_and_dropped() {
        let mut raw = Vec::new();
        raw.extend_from_slice(&START_MARKER);
        raw.extend_from_slice(&2u32.to_be_bytes());
        raw.extend_from_slice(&[0, 0, 0, b'X', b';']);
        raw.extend_from_slice(&END_MARKER);
        assert_eq!(
            decode(&raw),
            Err(FrameError::LengthMismatch {
                declared: 2,
                actual: 5
            })
        );

        let mut buf = FrameBuffer::new();
        buf.extend(&raw);
        buf.extend(&encode_cat("SB1;"));
        assert!(matches!(
            buf.next_packet(),
            Some(Err(FrameError::LengthMismatch { .. }))
        ));
        let pkt = buf.next_packet().unwrap().unwrap();
        assert_eq!(pkt.cat_text(), "SB1;");
    }

    #[test]
    fn missing_start_marker() {
        assert_eq!(decode(b"no frame here"), Err(FrameError::MissingStartMarker));
        let mut buf = FrameBuffer::new();
        buf.extend(b"no frame here");
        assert!(matches!(
            buf.next_packet(),
            Some(Err(FrameError::MissingStartMarker))
        ));
        assert!(buf.next_packet().is_none());
        assert_eq!(buf.len(), 3);
    }

    #[test]
    fn end_marker_inside_payload_is_not_a_boundary() {
        let mut body = b"AB".to_vec();
        body.extend_from_slice(&END_MARKER);
        body.extend_from_slice(b"CD");
        let pkt = Packet::new(PayloadType::Audio, 1, 7, &body);
        let (payload, consumed) = decode(&pkt.encode()).unwrap();
        assert_eq!(payload, pkt.payload);
        assert_eq!(consumed, pkt.encode().len());
    }

    #[test]
    fn packet_header_fields() {
        let pkt = Packet::new(PayloadType::Pan, 1, 42, &[9, 9]);
        let back = Packet::from_payload(pkt.payload.clone()).unwrap();
        assert_eq!(back.kind, PayloadType::Pan);
        assert_eq!(back.version, 1);
        assert_eq!(back.sequence, 42);
        assert_eq!(back.body(), &[9, 9]);
        assert_eq!(
            Packet::from_payload(Bytes::new()),
            Err(FrameError::EmptyPayload)
        );
    }
}
