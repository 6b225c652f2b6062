//! Little-endian PCM conversions between wire bytes and normalized floats.

pub const I32_SCALE: f32 = 2_147_483_648.0;
pub const I16_MAX: f32 = 32_767.0;

pub fn i32_le_to_f32(raw: &[u8], out: &mut Vec<f32>) {
    out.clear();
    out.reserve(raw.len() / 4);
    for chunk in raw.chunks_exact(4) {
        let v = i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        out.push(v as f32 / I32_SCALE);
    }
}

pub fn i16_le_to_f32(raw: &[u8], out: &mut Vec<f32>) {
    out.clear();
    out.reserve(raw.len() / 2);
    for chunk in raw.chunks_exact(2) {
        let v = i16::from_le_bytes([chunk[0], chunk[1]]);
        out.push(v as f32 / I16_MAX);
    }
}

/// Parses LE f32 bytes. Returns `None` when the length is not a multiple of 4.
pub fn f32_le_from_bytes(raw: &[u8]) -> Option<Vec<f32>> {
    if raw.len() % 4 != 0 {
        return None;
    }
    Some(
        raw.chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
    )
}

pub fn f32_to_le_bytes(samples: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * 4);
    for s in samples {
        out.extend_from_slice(&s.to_le_bytes());
    }
    out
}
