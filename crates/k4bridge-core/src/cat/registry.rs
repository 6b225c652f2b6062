//! The radio's CAT command surface as static data.

use super::{
    Category, CommandDescriptor, CompoundField, EnumTable, OperationKind, OperationSpec,
    ResponseParser, UiFields, ValueType,
};
use std::sync::OnceLock;

const fn op(kind: OperationKind, pattern: &'static str) -> OperationSpec {
    OperationSpec {
        kind,
        pattern,
        value: ValueType::None,
    }
}

const fn set(pattern: &'static str, value: ValueType) -> OperationSpec {
    OperationSpec {
        kind: OperationKind::Set,
        pattern,
        value,
    }
}

const fn get(pattern: &'static str) -> OperationSpec {
    op(OperationKind::Get, pattern)
}

const fn int(min: i64, max: i64) -> ValueType {
    ValueType::Int {
        min: Some(min),
        max: Some(max),
    }
}

const fn field(name: &'static str, width: usize) -> CompoundField {
    CompoundField {
        name,
        width,
        labels: None,
    }
}

const fn labelled(name: &'static str, width: usize, labels: EnumTable) -> CompoundField {
    CompoundField {
        name,
        width,
        labels: Some(labels),
    }
}

const fn ui(main: &'static [&'static str], sub: &'static [&'static str]) -> UiFields {
    UiFields { main, sub }
}

use OperationKind::{
    BandStackNext, BandStackRecall, Decrement, Increment, Normalize, Special, Toggle,
};

const FREQ: ValueType = int(30_000, 74_800_000);
const OFF_ON: EnumTable = &[("0", "OFF"), ("1", "ON")];

const MODES: EnumTable = &[
    ("1", "LSB"),
    ("2", "USB"),
    ("3", "CW"),
    ("4", "FM"),
    ("5", "AM"),
    ("6", "DATA"),
    ("7", "CW-R"),
    ("9", "DATA-R"),
];

const MIX: EnumTable = &[
    ("A.B", "Full stereo (main left, sub right)"),
    ("AB.AB", "Mono (main+sub both channels)"),
    ("A.-A", "Binaural (main left, main inverted right)"),
    ("A.AB", "Hybrid (main left, main+sub right)"),
    ("AB.B", "Hybrid (main+sub left, sub right)"),
    ("AB.A", "Hybrid (main+sub left, main right)"),
    ("B.AB", "Hybrid (sub left, main+sub right)"),
    ("B.B", "Sub only (sub both channels)"),
    ("B.A", "Swapped stereo (sub left, main right)"),
    ("A.A", "Main only (main both channels)"),
];

const BANDS: EnumTable = &[
    ("00", "160m"),
    ("01", "80m"),
    ("02", "40m"),
    ("03", "30m"),
    ("04", "20m"),
    ("05", "17m"),
    ("06", "15m"),
    ("07", "12m"),
    ("08", "10m"),
    ("09", "6m"),
    ("10", "4m"),
    ("16", "XVTR1"),
    ("17", "XVTR2"),
    ("18", "XVTR3"),
    ("19", "XVTR4"),
    ("20", "XVTR5"),
    ("21", "XVTR6"),
    ("22", "XVTR7"),
    ("23", "XVTR8"),
    ("24", "XVTR9"),
    ("25", "XVTR10"),
];

const RX_ANTENNAS: EnumTable = &[
    ("0", "Disconnected"),
    ("1", "EXT XVTR IN"),
    ("2", "RX uses TX ANT"),
    ("3", "INT XVTR IN"),
    ("4", "RX ANT IN1"),
    ("5", "ATU RX ANT1"),
    ("6", "ATU RX ANT2"),
    ("7", "ATU RX ANT3"),
];

const TUNING_STEPS: EnumTable = &[
    ("0", "1Hz"),
    ("1", "10Hz"),
    ("2", "100Hz"),
    ("3", "1kHz"),
    ("4", "10kHz"),
    ("5", "100kHz"),
];

const APF_BANDWIDTHS: EnumTable = &[("0", "30Hz"), ("1", "50Hz"), ("2", "150Hz")];
const NB_FILTERS: EnumTable = &[("0", "NONE"), ("1", "NARROW"), ("2", "WIDE")];
const SIGNS: EnumTable = &[("+", "positive"), ("-", "negative")];
const POWER_RANGES: EnumTable = &[("L", "Low (QRP)"), ("H", "High (QRO)"), ("X", "mW (XVTR)")];
const KEYER_MODIFIERS: EnumTable = &[(" ", "Normal"), ("R", "Repeat"), ("W", "Wait")];

static COMMANDS: &[CommandDescriptor] = &[
    // frequency
    CommandDescriptor {
        code: "FA",
        description: "VFO A frequency",
        category: Category::Frequency,
        sub_receiver: false,
        ai_eligible: true,
        operations: &[set("FA{value};", FREQ), get("FA;")],
        ui: ui(&["vfo_a_freq", "vfo_a_freq_hz"], &[]),
        parser: Some(ResponseParser::Frequency),
    },
    CommandDescriptor {
        code: "FB",
        description: "VFO B frequency",
        category: Category::Frequency,
        sub_receiver: false,
        ai_eligible: true,
        operations: &[set("FB{value};", FREQ), get("FB;")],
        ui: ui(&["vfo_b_freq", "vfo_b_freq_hz"], &[]),
        parser: Some(ResponseParser::Frequency),
    },
    CommandDescriptor {
        code: "FI",
        description: "IF center frequency",
        category: Category::Frequency,
        sub_receiver: true,
        ai_eligible: true,
        operations: &[set("FI{$}{value};", FREQ), get("FI{$};")],
        ui: ui(
            &["if_center_freq", "if_center_freq_hz"],
            &["if_center_freq_sub", "if_center_freq_sub_hz"],
        ),
        parser: Some(ResponseParser::Frequency),
    },
    CommandDescriptor {
        code: "FC",
        description: "Center panadapter on VFO",
        category: Category::Frequency,
        sub_receiver: true,
        ai_eligible: false,
        operations: &[
            set("FC{$};", ValueType::None),
            OperationSpec {
                kind: Special,
                pattern: "FC{$}{value};",
                value: ValueType::Int {
                    min: None,
                    max: None,
                },
            },
        ],
        ui: ui(&["panadapter_centered"], &["panadapter_centered_sub"]),
        parser: None,
    },
    CommandDescriptor {
        code: "FT",
        description: "Split operation",
        category: Category::Frequency,
        sub_receiver: false,
        ai_eligible: true,
        operations: &[
            set("FT{value};", ValueType::Enum(OFF_ON)),
            get("FT;"),
            op(Toggle, "FT/;"),
        ],
        ui: ui(&["split_enabled"], &[]),
        parser: None,
    },
    CommandDescriptor {
        code: "VT",
        description: "VFO tuning step",
        category: Category::Frequency,
        sub_receiver: true,
        ai_eligible: true,
        operations: &[
            set(
                "VT{$}{value};",
                ValueType::Compound(&[labelled("step", 1, TUNING_STEPS), field("mode", 1)]),
            ),
            get("VT{$};"),
            op(Toggle, "VT{$}/;"),
            op(Special, "VT{$}\\;"),
        ],
        ui: ui(&["vfo_step", "vfo_step_hz"], &["vfo_step_sub", "vfo_step_sub_hz"]),
        parser: None,
    },
    // audio
    CommandDescriptor {
        code: "AG",
        description: "AF gain",
        category: Category::Audio,
        sub_receiver: true,
        ai_eligible: true,
        operations: &[
            set("AG{$}{value};", int(0, 60)),
            get("AG{$};"),
            op(Toggle, "AG{$}/;"),
            op(Increment, "AG{$}+;"),
            op(Decrement, "AG{$}-;"),
        ],
        ui: ui(&["af_gain_main"], &["af_gain_sub"]),
        parser: None,
    },
    CommandDescriptor {
        code: "AL",
        description: "AF limiter",
        category: Category::Audio,
        sub_receiver: false,
        ai_eligible: true,
        operations: &[set("AL{value};", int(1, 30)), get("AL;")],
        ui: ui(&["af_limiter"], &[]),
        parser: None,
    },
    CommandDescriptor {
        code: "BL",
        description: "Audio balance",
        category: Category::Audio,
        sub_receiver: false,
        ai_eligible: true,
        operations: &[
            set(
                "BL{value};",
                ValueType::Compound(&[labelled("mode", 1, OFF_ON), field("balance", 3)]),
            ),
            get("BL;"),
            op(Toggle, "BL/;"),
            op(Normalize, "BL~;"),
        ],
        ui: ui(&["balance_mode", "balance_level"], &[]),
        parser: None,
    },
    CommandDescriptor {
        code: "MG",
        description: "Mic gain",
        category: Category::Audio,
        sub_receiver: false,
        ai_eligible: true,
        operations: &[set("MG{value};", int(0, 80)), get("MG;")],
        ui: ui(&["mic_gain"], &[]),
        parser: None,
    },
    CommandDescriptor {
        code: "MX",
        description: "Main/sub audio mix",
        category: Category::Audio,
        sub_receiver: false,
        ai_eligible: true,
        operations: &[set("MX{value};", ValueType::Enum(MIX)), get("MX;")],
        ui: ui(&["audio_mix"], &[]),
        parser: None,
    },
    CommandDescriptor {
        code: "NB",
        description: "Noise blanker",
        category: Category::Audio,
        sub_receiver: true,
        ai_eligible: true,
        operations: &[
            set(
                "NB{$}{value};",
                ValueType::Compound(&[
                    field("level", 2),
                    labelled("enabled", 1, OFF_ON),
                    labelled("filter", 1, NB_FILTERS),
                ]),
            ),
            get("NB{$};"),
            op(Toggle, "NB{$}/;"),
        ],
        ui: ui(
            &["nb_level", "nb_enabled", "nb_filter"],
            &["nb_level_sub", "nb_enabled_sub", "nb_filter_sub"],
        ),
        parser: None,
    },
    CommandDescriptor {
        code: "NR",
        description: "Noise reduction",
        category: Category::Audio,
        sub_receiver: true,
        ai_eligible: true,
        operations: &[
            set(
                "NR{$}{value};",
                ValueType::Compound(&[field("level", 2), labelled("enabled", 1, OFF_ON)]),
            ),
            get("NR{$};"),
            op(Toggle, "NR{$}/;"),
        ],
        ui: ui(&["nr_level", "nr_enabled"], &["nr_level_sub", "nr_enabled_sub"]),
        parser: None,
    },
    // mode
    CommandDescriptor {
        code: "MD",
        description: "Operating mode",
        category: Category::Mode,
        sub_receiver: true,
        ai_eligible: true,
        operations: &[
            set("MD{$}{value};", ValueType::Enum(MODES)),
            get("MD{$};"),
            op(Toggle, "MD{$}/;"),
            op(Increment, "MD{$}+;"),
            op(Decrement, "MD{$}-;"),
        ],
        ui: ui(&["mode_a"], &["mode_b"]),
        parser: Some(ResponseParser::Mode),
    },
    CommandDescriptor {
        code: "DT",
        description: "Data sub-mode",
        category: Category::Mode,
        sub_receiver: true,
        ai_eligible: true,
        operations: &[
            set(
                "DT{$}{value};",
                ValueType::Enum(&[
                    ("0", "DATA A"),
                    ("1", "AFSK A"),
                    ("2", "FSK D"),
                    ("3", "PSK D"),
                ]),
            ),
            get("DT{$};"),
        ],
        ui: ui(&["data_mode_a"], &["data_mode_b"]),
        parser: None,
    },
    CommandDescriptor {
        code: "GT",
        description: "AGC mode",
        category: Category::Mode,
        sub_receiver: true,
        ai_eligible: true,
        operations: &[
            set(
                "GT{$}{value};",
                ValueType::Enum(&[("0", "OFF"), ("1", "SLOW"), ("2", "FAST")]),
            ),
            get("GT{$};"),
            op(Toggle, "GT{$}/;"),
        ],
        ui: ui(&["agc_mode"], &["agc_mode_sub"]),
        parser: None,
    },
    // filter
    CommandDescriptor {
        code: "AP",
        description: "Audio peak filter",
        category: Category::Filter,
        sub_receiver: true,
        ai_eligible: true,
        operations: &[
            set(
                "AP{$}{value};",
                ValueType::Compound(&[
                    labelled("mode", 1, OFF_ON),
                    labelled("bandwidth", 1, APF_BANDWIDTHS),
                ]),
            ),
            get("AP{$};"),
            op(Toggle, "AP{$}/;"),
            op(Increment, "AP{$}+;"),
            op(Decrement, "AP{$}-;"),
        ],
        ui: ui(
            &["apf_mode", "apf_bandwidth"],
            &["apf_mode_sub", "apf_bandwidth_sub"],
        ),
        parser: Some(ResponseParser::Apf),
    },
    CommandDescriptor {
        code: "BW",
        description: "Filter bandwidth (10 Hz units)",
        category: Category::Filter,
        sub_receiver: true,
        ai_eligible: true,
        operations: &[set("BW{$}{value};", int(50, 40_000)), get("BW{$};")],
        ui: ui(&["bandwidth"], &["bandwidth_sub"]),
        parser: None,
    },
    CommandDescriptor {
        code: "IS",
        description: "Filter shift / IF center (10 Hz units)",
        category: Category::Filter,
        sub_receiver: true,
        ai_eligible: true,
        operations: &[set("IS{$}{value};", int(0, 9_999)), get("IS{$};")],
        ui: ui(&["filter_shift"], &["filter_shift_sub"]),
        parser: None,
    },
    CommandDescriptor {
        code: "CW",
        description: "CW pitch (10 Hz units)",
        category: Category::Filter,
        sub_receiver: false,
        ai_eligible: true,
        operations: &[set("CW{value};", int(25, 95)), get("CW;")],
        ui: ui(&["cw_pitch"], &[]),
        parser: None,
    },
    CommandDescriptor {
        code: "FP",
        description: "Filter preset",
        category: Category::Filter,
        sub_receiver: true,
        ai_eligible: true,
        operations: &[
            set(
                "FP{$}{value};",
                ValueType::Enum(&[("1", "Preset 1"), ("2", "Preset 2"), ("3", "Preset 3")]),
            ),
            get("FP{$};"),
            op(Increment, "FP{$}+;"),
            op(Normalize, "FP~;"),
        ],
        ui: ui(&["filter_preset"], &["filter_preset_sub"]),
        parser: None,
    },
    // antenna
    CommandDescriptor {
        code: "AN",
        description: "TX antenna",
        category: Category::Antenna,
        sub_receiver: false,
        ai_eligible: true,
        operations: &[
            set(
                "AN{value};",
                ValueType::Enum(&[("1", "ANT1"), ("2", "ANT2"), ("3", "ANT3")]),
            ),
            get("AN;"),
            op(Toggle, "AN/;"),
        ],
        ui: ui(&["tx_antenna"], &[]),
        parser: None,
    },
    CommandDescriptor {
        code: "AR",
        description: "RX antenna",
        category: Category::Antenna,
        sub_receiver: true,
        ai_eligible: true,
        operations: &[
            set("AR{$}{value};", ValueType::Enum(RX_ANTENNAS)),
            get("AR{$};"),
            op(Toggle, "AR{$}/;"),
        ],
        ui: ui(&["rx_antenna"], &["rx_antenna_sub"]),
        parser: None,
    },
    CommandDescriptor {
        code: "AT",
        description: "ATU mode",
        category: Category::Antenna,
        sub_receiver: false,
        ai_eligible: true,
        operations: &[
            set(
                "AT{value};",
                ValueType::Enum(&[("0", "NOT INST"), ("1", "BYPASS"), ("2", "AUTO")]),
            ),
            get("AT;"),
            op(Toggle, "AT/;"),
        ],
        ui: ui(&["atu_mode"], &[]),
        parser: None,
    },
    // band
    CommandDescriptor {
        code: "BN",
        description: "Band",
        category: Category::Band,
        sub_receiver: true,
        ai_eligible: true,
        operations: &[
            set("BN{$}{value};", ValueType::Enum(BANDS)),
            get("BN{$};"),
            op(Toggle, "BN{$}/;"),
            op(Increment, "BN{$}+;"),
            op(Decrement, "BN{$}-;"),
            op(BandStackNext, "BN{$}^;"),
            op(BandStackRecall, "BN{$}>;"),
        ],
        ui: ui(&["band_main"], &["band_sub"]),
        parser: None,
    },
    // rit / xit
    CommandDescriptor {
        code: "RT",
        description: "RIT on/off",
        category: Category::RitXit,
        sub_receiver: true,
        ai_eligible: true,
        operations: &[
            set("RT{$}{value};", ValueType::Enum(OFF_ON)),
            get("RT{$};"),
            op(Toggle, "RT{$}/;"),
        ],
        ui: ui(&["rit_enabled"], &["rit_enabled_sub"]),
        parser: None,
    },
    CommandDescriptor {
        code: "XT",
        description: "XIT on/off",
        category: Category::RitXit,
        sub_receiver: false,
        ai_eligible: true,
        operations: &[
            set("XT{value};", ValueType::Enum(OFF_ON)),
            get("XT;"),
            op(Toggle, "XT/;"),
        ],
        ui: ui(&["xit_enabled"], &[]),
        parser: None,
    },
    CommandDescriptor {
        code: "RO",
        description: "RIT/XIT offset",
        category: Category::RitXit,
        sub_receiver: true,
        ai_eligible: true,
        operations: &[
            set(
                "RO{$}{value};",
                ValueType::Compound(&[labelled("sign", 1, SIGNS), field("value", 4)]),
            ),
            get("RO{$};"),
        ],
        ui: ui(&["rit_offset", "xit_offset"], &["rit_offset_sub", "xit_offset_sub"]),
        parser: None,
    },
    // transmit
    CommandDescriptor {
        code: "PC",
        description: "Power output",
        category: Category::Transmit,
        sub_receiver: false,
        ai_eligible: true,
        operations: &[
            set(
                "PC{value};",
                ValueType::Compound(&[field("power", 3), labelled("range", 1, POWER_RANGES)]),
            ),
            get("PC;"),
        ],
        ui: ui(&["power_output", "power_range"], &[]),
        parser: None,
    },
    CommandDescriptor {
        code: "TX",
        description: "Enter transmit",
        category: Category::Transmit,
        sub_receiver: false,
        ai_eligible: true,
        operations: &[set("TX;", ValueType::None)],
        ui: ui(&["tx_mode"], &[]),
        parser: None,
    },
    CommandDescriptor {
        code: "RX",
        description: "Return to receive",
        category: Category::Transmit,
        sub_receiver: false,
        ai_eligible: true,
        operations: &[set("RX;", ValueType::None)],
        ui: ui(&["rx_mode"], &[]),
        parser: None,
    },
    // cw text
    CommandDescriptor {
        code: "KS",
        description: "Keyer speed (WPM)",
        category: Category::CwText,
        sub_receiver: false,
        ai_eligible: true,
        operations: &[set("KS{value};", int(8, 100)), get("KS;")],
        ui: ui(&["keyer_speed"], &[]),
        parser: None,
    },
    CommandDescriptor {
        code: "KY",
        description: "Send CW text",
        category: Category::CwText,
        sub_receiver: false,
        ai_eligible: false,
        operations: &[set(
            "KY{value};",
            ValueType::Compound(&[labelled("modifier", 1, KEYER_MODIFIERS), field("text", 0)]),
        )],
        ui: ui(&["cw_text_status"], &[]),
        parser: None,
    },
    // system
    CommandDescriptor {
        code: "AI",
        description: "Auto-info mode",
        category: Category::System,
        sub_receiver: false,
        ai_eligible: false,
        operations: &[
            set(
                "AI{value};",
                ValueType::Enum(&[
                    ("0", "Off"),
                    ("1", "VFO/RIT periodic"),
                    ("2", "All changes periodic"),
                    ("4", "Immediate non-client changes"),
                    ("5", "Immediate all changes"),
                ]),
            ),
            get("AI;"),
        ],
        ui: ui(&["ai_mode"], &[]),
        parser: None,
    },
    CommandDescriptor {
        code: "IF",
        description: "Transceiver status",
        category: Category::System,
        sub_receiver: false,
        ai_eligible: true,
        operations: &[get("IF;")],
        ui: ui(
            &[
                "frequency",
                "rit_offset",
                "rit_on",
                "xit_on",
                "tx_state",
                "mode",
                "scan",
                "split",
                "data_submode",
            ],
            &[],
        ),
        parser: None,
    },
    CommandDescriptor {
        code: "SM",
        description: "S-meter",
        category: Category::System,
        sub_receiver: true,
        ai_eligible: true,
        operations: &[
            get("SM{$};"),
            set("SM{$}{value};", ValueType::Enum(&[("1", "Auto-delivery on")])),
        ],
        ui: ui(&["s_meter"], &["s_meter_sub"]),
        parser: None,
    },
    CommandDescriptor {
        code: "SB",
        description: "Sub receiver on/off",
        category: Category::System,
        sub_receiver: false,
        ai_eligible: true,
        operations: &[
            set("SB{value};", ValueType::Enum(OFF_ON)),
            get("SB;"),
            op(Toggle, "SB/;"),
        ],
        ui: ui(&["sub_receiver_enabled"], &[]),
        parser: None,
    },
    CommandDescriptor {
        code: "TM",
        description: "TX meter auto-delivery",
        category: Category::System,
        sub_receiver: false,
        ai_eligible: false,
        operations: &[set(
            "TM{value};",
            ValueType::Enum(&[("0", "Off"), ("1", "On")]),
        )],
        ui: ui(&["tx_meter_auto"], &[]),
        parser: None,
    },
    CommandDescriptor {
        code: "LK",
        description: "VFO lock",
        category: Category::System,
        sub_receiver: true,
        ai_eligible: true,
        operations: &[
            set(
                "LK{$}{value};",
                ValueType::Enum(&[("0", "Unlock"), ("1", "Lock")]),
            ),
            get("LK{$};"),
            op(Toggle, "LK{$}/;"),
        ],
        ui: ui(&["vfo_lock"], &["vfo_lock_sub"]),
        parser: None,
    },
    CommandDescriptor {
        code: "ME",
        description: "Menu parameter",
        category: Category::System,
        sub_receiver: false,
        ai_eligible: false,
        operations: &[set("ME{value};", ValueType::Text)],
        ui: ui(&["menu_parameter"], &[]),
        parser: None,
    },
    // display
    CommandDescriptor {
        code: "#SPN",
        description: "Panadapter span (Hz)",
        category: Category::Display,
        sub_receiver: true,
        ai_eligible: true,
        operations: &[set("#SPN{$}{value};", int(6_000, 368_000)), get("#SPN{$};")],
        ui: ui(&["pan_span"], &["pan_span_sub"]),
        parser: None,
    },
    CommandDescriptor {
        code: "#REF",
        description: "Panadapter reference level (dBm)",
        category: Category::Display,
        sub_receiver: true,
        ai_eligible: true,
        operations: &[set("#REF{$}{value};", int(-200, 60)), get("#REF{$};")],
        ui: ui(&["pan_ref_level"], &["pan_ref_level_sub"]),
        parser: None,
    },
    CommandDescriptor {
        code: "#HREF",
        description: "Panadapter hardware reference level (dBm)",
        category: Category::Display,
        sub_receiver: true,
        ai_eligible: true,
        operations: &[
            set(
                "#HREF{$}{value};",
                ValueType::Int {
                    min: None,
                    max: None,
                },
            ),
            get("#HREF{$};"),
        ],
        ui: ui(&["pan_hw_ref_level"], &["pan_hw_ref_level_sub"]),
        parser: None,
    },
    CommandDescriptor {
        code: "#SCL",
        description: "Panadapter scale (dB)",
        category: Category::Display,
        sub_receiver: true,
        ai_eligible: true,
        operations: &[set("#SCL{$}{value};", int(10, 150)), get("#SCL{$};")],
        ui: ui(&["pan_scale"], &["pan_scale_sub"]),
        parser: None,
    },
    CommandDescriptor {
        code: "#AVG",
        description: "Panadapter averaging",
        category: Category::Display,
        sub_receiver: false,
        ai_eligible: true,
        operations: &[set("#AVG{value};", int(1, 20)), get("#AVG;")],
        ui: ui(&["pan_averaging"], &[]),
        parser: None,
    },
    // remote
    CommandDescriptor {
        code: "EM",
        description: "Audio encoding mode",
        category: Category::Remote,
        sub_receiver: false,
        ai_eligible: true,
        operations: &[
            set(
                "EM{value};",
                ValueType::Enum(&[
                    ("0", "Raw 32-bit"),
                    ("1", "Raw 16-bit"),
                    ("2", "Opus 16-bit"),
                    ("3", "Opus 32-bit"),
                ]),
            ),
            get("EM;"),
        ],
        ui: ui(&["audio_encoding"], &[]),
        parser: None,
    },
];

pub fn descriptors() -> &'static [CommandDescriptor] {
    COMMANDS
}

pub fn descriptor(code: &str) -> Option<&'static CommandDescriptor> {
    COMMANDS.iter().find(|d| d.code == code)
}

/// Codes ordered longest first so prefix matching picks `#SPN` over shorter codes.
fn by_length() -> &'static [&'static CommandDescriptor] {
    static INDEX: OnceLock<Vec<&'static CommandDescriptor>> = OnceLock::new();
    INDEX.get_or_init(|| {
        let mut all: Vec<&'static CommandDescriptor> = COMMANDS.iter().collect();
        all.sort_by(|a, b| b.code.len().cmp(&a.code.len()));
        all
    })
}

/// Longest registered code that `text` starts with.
pub fn longest_prefix(text: &str) -> Option<&'static CommandDescriptor> {
    by_length().iter().copied().find(|d| text.starts_with(d.code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn codes_are_unique() {
        let mut seen = HashSet::new();
        for d in descriptors() {
            assert!(seen.insert(d.code), "duplicate code {}", d.code);
        }
    }

    #[test]
    fn every_pattern_starts_with_its_code() {
        for d in descriptors() {
            assert!(!d.operations.is_empty(), "{} has no operations", d.code);
            for op in d.operations {
                assert!(
                    op.pattern.starts_with(d.code),
                    "{}: {}",
                    d.code,
                    op.pattern
                );
                assert!(op.pattern.ends_with(';'), "{}: {}", d.code, op.pattern);
                if op.pattern.contains("{$}") {
                    assert!(d.sub_receiver, "{} uses {{$}} without sub support", d.code);
                }
            }
        }
    }

    #[test]
    fn longest_prefix_prefers_display_codes() {
        assert_eq!(longest_prefix("#SPN50000").map(|d| d.code), Some("#SPN"));
        assert_eq!(longest_prefix("#HREF-110").map(|d| d.code), Some("#HREF"));
        assert_eq!(longest_prefix("FA00014060000").map(|d| d.code), Some("FA"));
        assert!(longest_prefix("ZZ1").is_none());
    }

    #[test]
    fn auto_info_exclusions() {
        for code in ["FC", "KY", "AI", "TM", "ME"] {
            assert!(!descriptor(code).unwrap().ai_eligible, "{code}");
        }
        assert!(descriptor("FA").unwrap().ai_eligible);
    }
}
