//! Wire text for the structured client controls (VFO and filter panels).

use crate::error::CatError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_FILTER_BW: f64 = 3.00;
pub const DEFAULT_FILTER_SHIFT: f64 = 1.50;

pub const MODE_CODES: &[(&str, u8)] = &[
    ("LSB", 1),
    ("USB", 2),
    ("CW", 3),
    ("FM", 4),
    ("AM", 5),
    ("DATA", 6),
    ("CW-R", 7),
    ("DATA-R", 9),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Vfo {
    #[default]
    #[serde(alias = "a")]
    A,
    #[serde(alias = "b")]
    B,
}

impl Vfo {
    /// Sub receiver suffix. VFO B always addresses `$`.
    pub fn suffix(self) -> &'static str {
        match self {
            Vfo::A => "",
            Vfo::B => "$",
        }
    }

    pub fn letter(self) -> char {
        match self {
            Vfo::A => 'A',
            Vfo::B => 'B',
        }
    }
}

/// `M.kkk.hhh` display form of a frequency in Hz.
pub fn frequency_display(hz: i64) -> String {
    let mhz = hz.div_euclid(1_000_000);
    let khz = hz.rem_euclid(1_000_000) / 1000;
    let rest = hz.rem_euclid(1000);
    format!("{mhz}.{khz:03}.{rest:03}")
}

pub fn frequency(vfo: Vfo, hz: u64) -> String {
    format!("F{}{hz:011};", vfo.letter())
}

pub fn mode_code(mode: &str) -> Option<u8> {
    let upper = mode.trim().to_ascii_uppercase();
    MODE_CODES
        .iter()
        .find(|(name, _)| *name == upper)
        .map(|(_, code)| *code)
}

pub fn mode(vfo: Vfo, mode: &str) -> Result<String, CatError> {
    let code = mode_code(mode).ok_or_else(|| CatError::UnknownMode(mode.to_string()))?;
    Ok(format!("MD{}{code};", vfo.suffix()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseControl {
    Blanker,
    Reduction,
}

impl std::str::FromStr for NoiseControl {
    type Err = CatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NB" => Ok(NoiseControl::Blanker),
            "NR" => Ok(NoiseControl::Reduction),
            _ => Err(CatError::UnknownNoiseType(s.to_string())),
        }
    }
}

pub fn noise(vfo: Vfo, control: NoiseControl, enabled: bool, level: u8, filter: u8) -> String {
    let en = u8::from(enabled);
    match control {
        NoiseControl::Blanker => format!("NB{}0{level}{en}{filter};", vfo.suffix()),
        NoiseControl::Reduction => format!("NR{}{level:02}{en};", vfo.suffix()),
    }
}

pub fn toggle_sub_rx() -> &'static str {
    "SB/;"
}

pub fn filter_query(vfo: Vfo) -> String {
    format!("FP{};", vfo.suffix())
}

pub fn filter_cycle(vfo: Vfo) -> String {
    format!("FP{}+;", vfo.suffix())
}

/// UI kHz value to radio 10 Hz units.
fn to_ten_hz(ui: f64) -> i64 {
    (ui * 1000.0 / 10.0).round() as i64
}

/// `IS` then `BW` for a BW/SHIFT pair given in kHz.
pub fn filter_values(vfo: Vfo, bw: Option<f64>, shift: Option<f64>) -> [String; 2] {
    let bw = to_ten_hz(bw.unwrap_or(DEFAULT_FILTER_BW));
    let shift = to_ten_hz(shift.unwrap_or(DEFAULT_FILTER_SHIFT));
    [
        format!("IS{}{shift:04};", vfo.suffix()),
        format!("BW{}{bw:04};", vfo.suffix()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequency_is_zero_padded() {
        assert_eq!(frequency(Vfo::A, 14_060_000), "FA00014060000;");
        assert_eq!(frequency(Vfo::B, 7_040_000), "FB00007040000;");
        assert_eq!(frequency_display(14_086_500), "14.086.500");
        assert_eq!(frequency_display(7_000_001), "7.000.001");
    }

    #[test]
    fn mode_lookup() {
        assert_eq!(mode(Vfo::A, "usb").unwrap(), "MD2;");
        assert_eq!(mode(Vfo::B, "DATA-R").unwrap(), "MD$9;");
        assert_eq!(
            mode(Vfo::A, "SSTV"),
            Err(CatError::UnknownMode("SSTV".to_string()))
        );
    }

    #[test]
    fn noise_formats() {
        assert_eq!(noise(Vfo::A, NoiseControl::Blanker, true, 5, 0), "NB0510;");
        assert_eq!(noise(Vfo::B, NoiseControl::Reduction, false, 7, 0), "NR$070;");
        assert!("XX".parse::<NoiseControl>().is_err());
    }

    #[test]
    fn filter_commands() {
        assert_eq!(filter_query(Vfo::B), "FP$;");
        assert_eq!(filter_cycle(Vfo::A), "FP+;");
        assert_eq!(
            filter_values(Vfo::A, Some(2.4), Some(1.2)),
            ["IS0120;".to_string(), "BW0240;".to_string()]
        );
        assert_eq!(
            filter_values(Vfo::B, None, None),
            ["IS$0150;".to_string(), "BW$0300;".to_string()]
        );
    }

    #[test]
    fn formatted_commands_pass_validation() {
        for text in [
            frequency(Vfo::A, 14_060_000),
            mode(Vfo::B, "CW").unwrap(),
            noise(Vfo::A, NoiseControl::Blanker, true, 5, 0),
            noise(Vfo::B, NoiseControl::Reduction, true, 10, 0),
            filter_query(Vfo::B),
            filter_cycle(Vfo::B),
            toggle_sub_rx().to_string(),
        ] {
            assert!(crate::cat::parse(&text).is_ok(), "{text}");
        }
    }
}
