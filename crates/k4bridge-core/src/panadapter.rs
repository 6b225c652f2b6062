//! Spectrum (PAN) packet decoding, waterfall history and the display state
//! the radio reports over CAT.

use crate::cat::format::Vfo;
use crate::config;
use crate::error::SpectrumError;
use crate::util::unix_time;
use serde::Serialize;
use std::collections::VecDeque;

pub const PAN_PACKET_TYPE: u8 = 2;
/// General header (3) plus the PAN header (24).
pub const PAN_HEADER_LEN: usize = 27;
/// `dBm = byte + DBM_OFFSET`. The documented x10 factor gives implausible
/// levels on real hardware and is not applied.
pub const DBM_OFFSET: f32 = -160.0;

pub const MAIN_RECEIVER: u8 = 0;

pub const REFERENCE_LEVEL_RANGE: (i32, i32) = (-200, 60);
pub const SPAN_RANGE: (i64, i64) = (6_000, 368_000);
pub const SCALE_RANGE: (i32, i32) = (10, 150);
pub const CW_PITCH_RANGE: (i64, i64) = (25, 95);

/// Windowing only kicks in above this many delivered bins.
const WINDOW_MIN_TOTAL_BINS: usize = 100;
const WINDOW_MIN_BINS: usize = 50;

const DEFAULT_FILTER_IS: i64 = 150;
const DEFAULT_FILTER_BW: i64 = 300;
const DEFAULT_CW_PITCH: i64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpectrumHeader {
    pub version: u8,
    pub sequence: u8,
    pub pan_type: u8,
    pub receiver: u8,
    pub data_len: u16,
    pub center_frequency: i64,
    /// kHz.
    pub sample_rate: i32,
    pub noise_floor: i32,
}

impl SpectrumHeader {
    pub fn parse(payload: &[u8]) -> Result<Self, SpectrumError> {
        if payload.len() < PAN_HEADER_LEN {
            return Err(SpectrumError::TooShort {
                len: payload.len(),
                need: PAN_HEADER_LEN,
            });
        }
        if payload[0] != PAN_PACKET_TYPE {
            return Err(SpectrumError::WrongPacketType(payload[0]));
        }
        let mut center = [0u8; 8];
        center.copy_from_slice(&payload[11..19]);
        let mut rate = [0u8; 4];
        rate.copy_from_slice(&payload[19..23]);
        let mut noise = [0u8; 4];
        noise.copy_from_slice(&payload[23..27]);
        Ok(Self {
            version: payload[1],
            sequence: payload[2],
            pan_type: payload[3],
            receiver: payload[4],
            data_len: u16::from_le_bytes([payload[5], payload[6]]),
            center_frequency: i64::from_le_bytes(center),
            sample_rate: i32::from_le_bytes(rate),
            noise_floor: i32::from_le_bytes(noise),
        })
    }
}

/// Maps compressed bins to dBm.
pub fn decompress(bins: &[u8]) -> Vec<f32> {
    bins.iter().map(|&b| f32::from(b) + DBM_OFFSET).collect()
}

/// Radio sample-rate tier (kHz) that covers `span_hz`.
pub fn expected_sample_rate(span_hz: i64) -> u32 {
    let khz = span_hz as f64 / 1000.0;
    if khz <= 19.0 {
        24
    } else if khz <= 36.0 {
        48
    } else if khz <= 82.0 {
        96
    } else if khz <= 172.0 {
        192
    } else {
        384
    }
}

/// Centered sub-window of `bins` covering `requested / delivered` of the
/// delivered span. `None` when the delivered data should be used as is.
pub fn select_window(bins: usize, requested_span: i64, delivered_span: i64) -> Option<(usize, usize)> {
    if delivered_span <= requested_span
        || bins <= WINDOW_MIN_TOTAL_BINS
        || requested_span <= 0
        || delivered_span <= 0
    {
        return None;
    }
    let wanted = (requested_span as f64 / delivered_span as f64 * bins as f64) as usize;
    let wanted = wanted.clamp(WINDOW_MIN_BINS, bins);
    let start = (bins - wanted) / 2;
    Some((start, start + wanted))
}

#[derive(Debug, Clone, Serialize)]
pub struct WaterfallLine {
    pub data: Vec<f32>,
    pub timestamp: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SpectrumFrame {
    pub center_frequency: i64,
    /// Span the `spectrum_data` bins actually cover.
    pub span: i64,
    pub sample_rate: i32,
    pub noise_floor: i32,
    pub reference_level: i32,
    pub spectrum_data: Vec<f32>,
    pub receiver_id: String,
    pub timestamp: f64,
    pub bins: usize,
    pub waterfall_data: Vec<WaterfallLine>,
    pub source: &'static str,
    pub actual_start_freq: f64,
    pub actual_end_freq: f64,
    pub k4_actual_span: i64,
    pub requested_span: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Boundaries {
    pub center_frequency: i64,
    pub span: i64,
    pub actual_start_freq: f64,
    pub actual_end_freq: f64,
    pub expected_sample_rate: u32,
    pub timestamp: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    HiLo,
    BwShft,
}

/// Raw IS/BW values are in units of 10 Hz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterState {
    pub is_value: i64,
    pub bw_value: i64,
    pub mode: FilterMode,
    pub pitch: i64,
    pub current: i64,
    #[serde(skip)]
    needs_update: bool,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            is_value: 0,
            bw_value: 0,
            mode: FilterMode::HiLo,
            pitch: DEFAULT_CW_PITCH,
            current: 1,
            needs_update: false,
        }
    }
}

/// Filter values in the client's BW/SHIFT model (kHz, two decimals).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterUiValues {
    pub current: i64,
    pub bw: f64,
    pub shft: f64,
    pub k4_is: i64,
    pub k4_bw: i64,
    pub pitch: i64,
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

impl FilterState {
    pub fn ui_values(&self) -> FilterUiValues {
        if self.bw_value == 0 || self.is_value == 0 {
            return FilterUiValues {
                current: self.current,
                bw: crate::cat::format::DEFAULT_FILTER_BW,
                shft: crate::cat::format::DEFAULT_FILTER_SHIFT,
                k4_is: DEFAULT_FILTER_IS,
                k4_bw: DEFAULT_FILTER_BW,
                pitch: self.pitch,
            };
        }
        FilterUiValues {
            current: self.current,
            bw: round2(self.bw_value as f64 * 10.0 / 1000.0),
            shft: round2(self.is_value as f64 * 10.0 / 1000.0),
            k4_is: self.is_value,
            k4_bw: self.bw_value,
            pitch: self.pitch,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PanadapterSnapshot {
    pub center_frequency: i64,
    pub span: i64,
    pub reference_level: i32,
    pub hardware_reference_level: i32,
    pub noise_floor: i32,
    pub scale: i32,
    pub vfo_a_frequency: i64,
    pub vfo_b_frequency: i64,
    pub waterfall_lines: usize,
    pub filter_a: FilterState,
    pub filter_b: FilterState,
}

/// Per-session panadapter state.
#[derive(Debug)]
pub struct Panadapter {
    center_frequency: i64,
    span: i64,
    reference_level: i32,
    hardware_reference_level: i32,
    noise_floor: i32,
    scale: i32,
    vfo_a_frequency: i64,
    vfo_b_frequency: i64,
    filter_a: FilterState,
    filter_b: FilterState,
    waterfall: VecDeque<WaterfallLine>,
    max_waterfall_lines: usize,
    history_echo: usize,
    pending_boundaries: Option<Boundaries>,
}

impl Default for Panadapter {
    fn default() -> Self {
        Self::new(&config::Panadapter::default())
    }
}

impl Panadapter {
    /// Center frequency and display reference start at zero until the radio
    /// reports them.
    pub fn new(cfg: &config::Panadapter) -> Self {
        let max_waterfall_lines = cfg.max_waterfall_lines.max(1);
        Self {
            center_frequency: 0,
            span: cfg.span,
            reference_level: 0,
            hardware_reference_level: 0,
            noise_floor: cfg.noise_floor,
            scale: cfg.scale,
            vfo_a_frequency: 0,
            vfo_b_frequency: 0,
            filter_a: FilterState::default(),
            filter_b: FilterState::default(),
            waterfall: VecDeque::with_capacity(max_waterfall_lines),
            max_waterfall_lines,
            history_echo: cfg.waterfall_history_size,
            pending_boundaries: None,
        }
    }

    pub fn center_frequency(&self) -> i64 {
        self.center_frequency
    }

    pub fn span(&self) -> i64 {
        self.span
    }

    pub fn reference_level(&self) -> i32 {
        self.reference_level
    }

    pub fn scale(&self) -> i32 {
        self.scale
    }

    pub fn waterfall_len(&self) -> usize {
        self.waterfall.len()
    }

    pub fn filter(&self, vfo: Vfo) -> &FilterState {
        match vfo {
            Vfo::A => &self.filter_a,
            Vfo::B => &self.filter_b,
        }
    }

    fn filter_mut(&mut self, vfo: Vfo) -> &mut FilterState {
        match vfo {
            Vfo::A => &mut self.filter_a,
            Vfo::B => &mut self.filter_b,
        }
    }

    pub fn set_reference_level(&mut self, level: i32) {
        self.reference_level = level.clamp(REFERENCE_LEVEL_RANGE.0, REFERENCE_LEVEL_RANGE.1);
    }

    pub fn set_span(&mut self, span_hz: i64) {
        self.span = span_hz.clamp(SPAN_RANGE.0, SPAN_RANGE.1);
    }

    pub fn set_scale(&mut self, scale: i32) {
        self.scale = scale.clamp(SCALE_RANGE.0, SCALE_RANGE.1);
    }

    /// Span reported by the radio. Non-positive values are ignored; no
    /// boundary push is scheduled.
    pub fn update_span_from_cat(&mut self, span_hz: i64) -> bool {
        if span_hz <= 0 {
            tracing::debug!(span_hz, "ignoring non-positive span");
            return false;
        }
        self.span = span_hz;
        true
    }

    /// Boundaries for the current center and span, or `None` until both are
    /// known.
    pub fn boundaries(&self) -> Option<Boundaries> {
        if self.center_frequency == 0 || self.span == 0 {
            return None;
        }
        let half = self.span as f64 / 2.0;
        Some(Boundaries {
            center_frequency: self.center_frequency,
            span: self.span,
            actual_start_freq: self.center_frequency as f64 - half,
            actual_end_freq: self.center_frequency as f64 + half,
            expected_sample_rate: expected_sample_rate(self.span),
            timestamp: unix_time(),
        })
    }

    /// Takes the boundary push scheduled by the last center change.
    pub fn take_pending_boundaries(&mut self) -> Option<Boundaries> {
        self.pending_boundaries.take()
    }

    /// Filter UI values for every VFO with unsent changes. Clears the flags.
    pub fn take_filter_updates(&mut self) -> Vec<(Vfo, FilterUiValues)> {
        let mut out = Vec::new();
        for vfo in [Vfo::A, Vfo::B] {
            let state = self.filter_mut(vfo);
            if state.needs_update {
                state.needs_update = false;
                out.push((vfo, state.ui_values()));
            }
        }
        out
    }

    pub fn snapshot(&self) -> PanadapterSnapshot {
        PanadapterSnapshot {
            center_frequency: self.center_frequency,
            span: self.span,
            reference_level: self.reference_level,
            hardware_reference_level: self.hardware_reference_level,
            noise_floor: self.noise_floor,
            scale: self.scale,
            vfo_a_frequency: self.vfo_a_frequency,
            vfo_b_frequency: self.vfo_b_frequency,
            waterfall_lines: self.waterfall.len(),
            filter_a: self.filter_a.clone(),
            filter_b: self.filter_b.clone(),
        }
    }

    /// Decodes one PAN payload. Sub receiver spectra yield `Ok(None)` and
    /// leave the state untouched.
    pub fn process_spectrum_packet(
        &mut self,
        payload: &[u8],
    ) -> Result<Option<SpectrumFrame>, SpectrumError> {
        let header = SpectrumHeader::parse(payload)?;
        if header.receiver != MAIN_RECEIVER {
            return Ok(None);
        }

        let declared_end = PAN_HEADER_LEN + usize::from(header.data_len);
        let raw = &payload[PAN_HEADER_LEN..declared_end.min(payload.len())];
        let line = decompress(raw);
        if line.is_empty() {
            return Err(SpectrumError::NoBins);
        }

        let old_center = self.center_frequency;
        self.center_frequency = header.center_frequency;

        let now = unix_time();
        self.waterfall.push_back(WaterfallLine {
            data: line.clone(),
            timestamp: now,
        });
        while self.waterfall.len() > self.max_waterfall_lines {
            self.waterfall.pop_front();
        }

        if old_center != header.center_frequency && old_center != 0 {
            if let Some(b) = self.boundaries() {
                tracing::debug!(
                    old_center,
                    new_center = header.center_frequency,
                    span = self.span,
                    "center frequency moved"
                );
                self.pending_boundaries = Some(b);
            }
        }

        let delivered_span = if header.sample_rate > 0 {
            i64::from(header.sample_rate) * 1000
        } else {
            self.span
        };

        let (spectrum, effective_span) = match select_window(line.len(), self.span, delivered_span)
        {
            Some((start, end)) => (line[start..end].to_vec(), self.span),
            None => (line, delivered_span),
        };

        let half = effective_span as f64 / 2.0;
        let skip = self.waterfall.len().saturating_sub(self.history_echo);
        Ok(Some(SpectrumFrame {
            center_frequency: header.center_frequency,
            span: effective_span,
            sample_rate: header.sample_rate,
            noise_floor: self.noise_floor,
            reference_level: self.reference_level,
            bins: spectrum.len(),
            spectrum_data: spectrum,
            receiver_id: format!("Main_RX{}", header.receiver),
            timestamp: now,
            waterfall_data: self.waterfall.iter().skip(skip).cloned().collect(),
            source: "PAN",
            actual_start_freq: header.center_frequency as f64 - half,
            actual_end_freq: header.center_frequency as f64 + half,
            k4_actual_span: delivered_span,
            requested_span: self.span,
        }))
    }

    /// Applies every `;`-terminated command in `text`. Returns how many
    /// changed the state.
    pub fn apply_cat(&mut self, text: &str) -> usize {
        text.split(';')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .filter(|c| self.apply_command(c))
            .count()
    }

    fn apply_command(&mut self, cmd: &str) -> bool {
        let sub = cmd.contains('$');
        let vfo = if sub { Vfo::B } else { Vfo::A };
        let stripped: String = cmd.chars().filter(|&c| c != '$').collect();

        // Span, scale and tuning of the sub receiver never move the main display.
        if sub && ["#SPN", "#SCL", "FI", "FA", "FB"].iter().any(|p| stripped.starts_with(p)) {
            return false;
        }

        if let Some(v) = stripped.strip_prefix("#SPN") {
            return digits(v).is_some_and(|span| self.update_span_from_cat(span));
        }
        if let Some(v) = stripped.strip_prefix("#HREF") {
            return signed(v).is_some_and(|level| {
                self.hardware_reference_level = level;
                true
            });
        }
        if let Some(v) = stripped.strip_prefix("#REF") {
            return signed(v).is_some_and(|level| {
                self.set_reference_level(level);
                true
            });
        }
        if let Some(v) = stripped.strip_prefix("#SCL") {
            return signed(v).is_some_and(|scale| {
                self.set_scale(scale);
                true
            });
        }
        if let Some(v) = stripped.strip_prefix("FI") {
            return signed(v).is_some_and(|hz| {
                self.center_frequency = hz;
                true
            });
        }
        if let Some(v) = stripped.strip_prefix("FA") {
            return signed(v).is_some_and(|hz| {
                self.vfo_a_frequency = hz;
                true
            });
        }
        if let Some(v) = stripped.strip_prefix("FB") {
            return signed(v).is_some_and(|hz| {
                self.vfo_b_frequency = hz;
                true
            });
        }
        if let Some(v) = stripped.strip_prefix("IS") {
            return digits(v).is_some_and(|is| {
                let state = self.filter_mut(vfo);
                state.is_value = is;
                state.mode = FilterMode::BwShft;
                state.needs_update = true;
                true
            });
        }
        if let Some(v) = stripped.strip_prefix("BW") {
            return digits(v).is_some_and(|bw| {
                let state = self.filter_mut(vfo);
                state.bw_value = bw;
                state.mode = FilterMode::BwShft;
                state.needs_update = true;
                true
            });
        }
        if let Some(v) = stripped.strip_prefix("FP") {
            return digits(v).is_some_and(|preset| {
                let state = self.filter_mut(vfo);
                state.current = preset;
                state.needs_update = true;
                true
            });
        }
        if let Some(v) = stripped.strip_prefix("CW") {
            let Some(pitch) = digits(v) else {
                return false;
            };
            if !(CW_PITCH_RANGE.0..=CW_PITCH_RANGE.1).contains(&pitch) {
                tracing::debug!(pitch, "cw pitch out of range");
                return false;
            }
            let state = self.filter_mut(vfo);
            state.pitch = pitch;
            state.needs_update = true;
            return true;
        }
        false
    }
}

/// Unsigned decimal digits only, as the radio sends them.
fn digits(v: &str) -> Option<i64> {
    if v.is_empty() || !v.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    v.parse().ok()
}

fn signed<T: std::str::FromStr>(v: &str) -> Option<T> {
    v.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pan_payload(receiver: u8, center: i64, sample_rate: i32, bins: &[u8]) -> Vec<u8> {
        let mut p = vec![PAN_PACKET_TYPE, 1, 7, 0, receiver];
        p.extend_from_slice(&(bins.len() as u16).to_le_bytes());
        p.extend_from_slice(&[0; 4]);
        p.extend_from_slice(&center.to_le_bytes());
        p.extend_from_slice(&sample_rate.to_le_bytes());
        p.extend_from_slice(&(-1200i32).to_le_bytes());
        p.extend_from_slice(bins);
        p
    }

    #[test]
    fn decompression_offset() {
        assert_eq!(decompress(&[15, 0, 160]), vec![-145.0, -160.0, 0.0]);
    }

    #[test]
    fn header_fields() {
        let p = pan_payload(0, 14_086_500, 96, &[1, 2, 3]);
        let h = SpectrumHeader::parse(&p).unwrap();
        assert_eq!(h.center_frequency, 14_086_500);
        assert_eq!(h.sample_rate, 96);
        assert_eq!(h.noise_floor, -1200);
        assert_eq!(h.data_len, 3);
        assert_eq!(h.sequence, 7);
    }

    #[test]
    fn short_and_wrong_type_are_errors() {
        let mut pan = Panadapter::default();
        assert_eq!(
            pan.process_spectrum_packet(&[2; 10]).unwrap_err(),
            SpectrumError::TooShort { len: 10, need: 27 }
        );
        let mut p = pan_payload(0, 1, 0, &[1]);
        p[0] = 1;
        assert_eq!(
            pan.process_spectrum_packet(&p).unwrap_err(),
            SpectrumError::WrongPacketType(1)
        );
        let empty = pan_payload(0, 1, 0, &[]);
        assert_eq!(
            pan.process_spectrum_packet(&empty).unwrap_err(),
            SpectrumError::NoBins
        );
    }

    #[test]
    fn sub_receiver_spectrum_is_skipped() {
        let mut pan = Panadapter::default();
        let p = pan_payload(1, 7_000_000, 96, &[50; 200]);
        assert!(pan.process_spectrum_packet(&p).unwrap().is_none());
        assert_eq!(pan.center_frequency(), 0);
        assert_eq!(pan.waterfall_len(), 0);
    }

    #[test]
    fn boundaries_follow_center_and_span() {
        let mut pan = Panadapter::default();
        pan.apply_cat("FI14086500;#SPN50000;");
        let b = pan.boundaries().unwrap();
        assert_eq!(b.actual_start_freq, 14_061_500.0);
        assert_eq!(b.actual_end_freq, 14_111_500.0);
        assert_eq!(b.expected_sample_rate, 96);
    }

    #[test]
    fn windowing_extracts_centered_bins() {
        assert_eq!(select_window(800, 50_000, 80_000), Some((150, 650)));
        assert_eq!(select_window(80, 50_000, 80_000), None);
        assert_eq!(select_window(800, 80_000, 50_000), None);
        assert_eq!(select_window(1000, 1_000, 384_000), Some((475, 525)));

        let mut pan = Panadapter::default();
        let frame = pan
            .process_spectrum_packet(&pan_payload(0, 14_086_500, 80, &[40; 800]))
            .unwrap()
            .unwrap();
        assert_eq!(frame.bins, 500);
        assert_eq!(frame.span, 50_000);
        assert_eq!(frame.k4_actual_span, 80_000);
        assert_eq!(frame.requested_span, 50_000);
        assert_eq!(frame.actual_start_freq, 14_061_500.0);
        assert_eq!(frame.receiver_id, "Main_RX0");
        assert_eq!(frame.waterfall_data[0].data.len(), 800);
    }

    #[test]
    fn boundary_push_only_on_center_change() {
        let mut pan = Panadapter::default();
        let bins = [30u8; 120];
        pan.process_spectrum_packet(&pan_payload(0, 7_000_000, 48, &bins))
            .unwrap();
        assert!(pan.take_pending_boundaries().is_none());

        pan.apply_cat("#SPN30000;");
        assert!(pan.take_pending_boundaries().is_none());

        pan.process_spectrum_packet(&pan_payload(0, 7_010_000, 48, &bins))
            .unwrap();
        let b = pan.take_pending_boundaries().unwrap();
        assert_eq!(b.center_frequency, 7_010_000);
        assert_eq!(b.span, 30_000);
        assert!(pan.take_pending_boundaries().is_none());
    }

    #[test]
    fn waterfall_is_bounded_and_echo_is_truncated() {
        let cfg = config::Panadapter {
            max_waterfall_lines: 5,
            waterfall_history_size: 3,
            ..config::Panadapter::default()
        };
        let mut pan = Panadapter::new(&cfg);
        let mut last = None;
        for i in 0..8u8 {
            last = pan
                .process_spectrum_packet(&pan_payload(0, 1_000_000, 0, &[i; 4]))
                .unwrap();
        }
        assert_eq!(pan.waterfall_len(), 5);
        let frame = last.unwrap();
        assert_eq!(frame.waterfall_data.len(), 3);
        assert_eq!(frame.waterfall_data[2].data[0], 7.0 + DBM_OFFSET);
    }

    #[test]
    fn cat_updates_and_clamps() {
        let mut pan = Panadapter::default();
        assert_eq!(pan.apply_cat("#REF-250;#SCL5;#HREF-90;"), 3);
        assert_eq!(pan.reference_level(), -200);
        assert_eq!(pan.scale(), 10);
        assert_eq!(pan.snapshot().hardware_reference_level, -90);

        assert_eq!(pan.apply_cat("#SPN0;"), 0);
        assert_eq!(pan.apply_cat("#SPN500;"), 1);
        assert_eq!(pan.span(), 500);

        pan.set_span(500);
        assert_eq!(pan.span(), 6_000);

        pan.apply_cat("FA00014060000;FB00007040000;");
        let snap = pan.snapshot();
        assert_eq!(snap.vfo_a_frequency, 14_060_000);
        assert_eq!(snap.vfo_b_frequency, 7_040_000);
    }

    #[test]
    fn sub_receiver_display_commands_leave_main_state_alone() {
        let mut pan = Panadapter::default();
        pan.apply_cat("#SPN50000;FI14086500;#SCL70;");
        assert_eq!(pan.apply_cat("#SPN$100000;FI$7040000;#SCL$120;"), 0);
        assert_eq!(pan.span(), 50_000);
        assert_eq!(pan.center_frequency(), 14_086_500);
        assert_eq!(pan.scale(), 70);

        assert_eq!(pan.apply_cat("#REF$-100;"), 1);
        assert_eq!(pan.reference_level(), -100);
    }

    #[test]
    fn filter_updates_are_one_shot() {
        let mut pan = Panadapter::default();
        pan.apply_cat("BW$0240;IS$0120;");
        let updates = pan.take_filter_updates();
        assert_eq!(updates.len(), 1);
        let (vfo, ui) = &updates[0];
        assert_eq!(*vfo, Vfo::B);
        assert_eq!(ui.bw, 2.4);
        assert_eq!(ui.shft, 1.2);
        assert_eq!(ui.k4_bw, 240);
        assert_eq!(pan.filter(Vfo::B).mode, FilterMode::BwShft);
        assert!(pan.take_filter_updates().is_empty());
    }

    #[test]
    fn filter_defaults_until_both_values_known() {
        let mut pan = Panadapter::default();
        pan.apply_cat("FP2;");
        let (_, ui) = pan.take_filter_updates().remove(0);
        assert_eq!(ui.current, 2);
        assert_eq!(ui.bw, 3.0);
        assert_eq!(ui.shft, 1.5);
        assert_eq!(ui.k4_is, 150);
        assert_eq!(ui.k4_bw, 300);
    }

    #[test]
    fn cw_pitch_range() {
        let mut pan = Panadapter::default();
        assert_eq!(pan.apply_cat("CW99;"), 0);
        assert_eq!(pan.apply_cat("CW60;"), 1);
        assert_eq!(pan.filter(Vfo::A).pitch, 60);
        assert_eq!(pan.apply_cat("FP+;IS;BW;"), 0);
    }

    #[test]
    fn sample_rate_tiers() {
        assert_eq!(expected_sample_rate(19_000), 24);
        assert_eq!(expected_sample_rate(36_000), 48);
        assert_eq!(expected_sample_rate(82_000), 96);
        assert_eq!(expected_sample_rate(172_000), 192);
        assert_eq!(expected_sample_rate(200_000), 384);
    }
}
