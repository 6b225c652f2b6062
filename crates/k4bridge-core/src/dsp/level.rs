/// Scales the block down uniformly when any sample exceeds full scale.
/// Quiet blocks are left as they are.
pub fn limit_peak(samples: &mut [f32]) {
    let peak = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    if peak > 1.0 {
        let inv = 1.0 / peak;
        for s in samples.iter_mut() {
            *s *= inv;
        }
    }
}

/// Appends one zero when the count is odd so L/R pairing holds.
pub fn pad_to_even(samples: &mut Vec<f32>) {
    if samples.len() % 2 != 0 {
        samples.push(0.0);
    }
}

pub fn scale(samples: &mut [f32], gain: f32) {
    for s in samples.iter_mut() {
        *s *= gain;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_peak_normalizes_loud_blocks() {
        let mut s = vec![0.5, -4.0, 2.0];
        limit_peak(&mut s);
        assert_eq!(s, vec![0.125, -1.0, 0.5]);
    }

    #[test]
    fn limit_peak_keeps_quiet_blocks() {
        let mut s = vec![0.0005, -0.0002];
        limit_peak(&mut s);
        assert_eq!(s, vec![0.0005, -0.0002]);
    }

    #[test]
    fn pad_to_even_appends_single_zero() {
        let mut s = vec![0.1, 0.2, 0.3];
        pad_to_even(&mut s);
        assert_eq!(s, vec![0.1, 0.2, 0.3, 0.0]);
        pad_to_even(&mut s);
        assert_eq!(s.len(), 4);
    }
}
