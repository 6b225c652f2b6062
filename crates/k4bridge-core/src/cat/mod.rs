//! CAT command engine: static registry, parser/validator, builder, response
//! classification and the client-side formatters.

pub mod builder;
pub mod format;
pub mod history;
pub mod parser;
pub mod registry;

use serde::Serialize;
use serde_json::{Map, Value};

pub use builder::build;
pub use history::{CommandHistory, Direction, HistoryEntry, ResponseKind, ResponseReport};
pub use parser::parse;
pub use registry::{descriptor, descriptors};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationKind {
    Set,
    Get,
    Toggle,
    Increment,
    Decrement,
    Normalize,
    BandStackNext,
    BandStackRecall,
    Special,
}

impl OperationKind {
    pub fn from_operator(c: char) -> Option<Self> {
        Some(match c {
            '/' => OperationKind::Toggle,
            '+' => OperationKind::Increment,
            '-' => OperationKind::Decrement,
            '~' => OperationKind::Normalize,
            '^' => OperationKind::BandStackNext,
            '>' => OperationKind::BandStackRecall,
            '\\' => OperationKind::Special,
            _ => return None,
        })
    }

    pub fn operator(self) -> Option<char> {
        Some(match self {
            OperationKind::Toggle => '/',
            OperationKind::Increment => '+',
            OperationKind::Decrement => '-',
            OperationKind::Normalize => '~',
            OperationKind::BandStackNext => '^',
            OperationKind::BandStackRecall => '>',
            OperationKind::Special => '\\',
            OperationKind::Set | OperationKind::Get => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Set => "SET",
            OperationKind::Get => "GET",
            OperationKind::Toggle => "TOGGLE",
            OperationKind::Increment => "INCREMENT",
            OperationKind::Decrement => "DECREMENT",
            OperationKind::Normalize => "NORMALIZE",
            OperationKind::BandStackNext => "BAND_STACK_NEXT",
            OperationKind::BandStackRecall => "BAND_STACK_RECALL",
            OperationKind::Special => "SPECIAL_OP",
        }
    }
}

/// `(wire key, label)` pairs.
pub type EnumTable = &'static [(&'static str, &'static str)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompoundField {
    pub name: &'static str,
    /// Characters taken by this field; `0` takes the rest of the value.
    pub width: usize,
    pub labels: Option<EnumTable>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    None,
    Int { min: Option<i64>, max: Option<i64> },
    Enum(EnumTable),
    Compound(&'static [CompoundField]),
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationSpec {
    pub kind: OperationKind,
    /// Wire pattern with `{$}` and `{value}` placeholders.
    pub pattern: &'static str,
    pub value: ValueType,
}

impl OperationSpec {
    pub fn takes_value(&self) -> bool {
        self.pattern.contains("{value}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Frequency,
    Audio,
    Mode,
    Filter,
    Antenna,
    Band,
    RitXit,
    Transmit,
    CwText,
    System,
    Display,
    Remote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseParser {
    Frequency,
    Mode,
    Apf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiFields {
    pub main: &'static [&'static str],
    pub sub: &'static [&'static str],
}

#[derive(Debug, PartialEq, Eq)]
pub struct CommandDescriptor {
    pub code: &'static str,
    pub description: &'static str,
    pub category: Category,
    pub sub_receiver: bool,
    /// Whether the radio pushes this command as an auto-info update.
    pub ai_eligible: bool,
    pub operations: &'static [OperationSpec],
    pub ui: UiFields,
    pub parser: Option<ResponseParser>,
}

impl CommandDescriptor {
    pub fn operation(&self, kind: OperationKind) -> Option<&OperationSpec> {
        self.operations.iter().find(|op| op.kind == kind)
    }

    pub fn supports(&self, kind: OperationKind) -> bool {
        self.operation(kind).is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompoundPart {
    pub name: &'static str,
    pub key: String,
    pub label: Option<String>,
}

impl CompoundPart {
    fn display(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedValue {
    None,
    Int(i64),
    Enum { key: String, label: String },
    Compound(Vec<CompoundPart>),
    Text(String),
    /// Value that did not fit its declared grammar.
    Raw(String),
}

impl DecodedValue {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            DecodedValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    fn json(&self) -> Option<Value> {
        match self {
            DecodedValue::None | DecodedValue::Compound(_) => None,
            DecodedValue::Int(v) => Some(Value::from(*v)),
            DecodedValue::Enum { label, .. } => Some(Value::from(label.as_str())),
            DecodedValue::Text(s) | DecodedValue::Raw(s) => Some(Value::from(s.as_str())),
        }
    }
}

/// A validated command. Construction goes through [`parse`].
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedCommand {
    pub original: String,
    pub code: &'static str,
    pub kind: OperationKind,
    pub sub_receiver: bool,
    pub display: bool,
    pub raw_value: String,
    pub value: DecodedValue,
    pub descriptor: &'static CommandDescriptor,
}

impl ParsedCommand {
    /// UI field updates for a SET. Other operations project nothing.
    pub fn ui_update(&self) -> Map<String, Value> {
        let mut out = Map::new();
        if self.kind != OperationKind::Set {
            return out;
        }

        if let Some(parser) = self.descriptor.parser {
            self.apply_parser(parser, &mut out);
        }

        let fields = if self.sub_receiver {
            self.descriptor.ui.sub
        } else {
            self.descriptor.ui.main
        };
        match &self.value {
            DecodedValue::Compound(parts) => {
                for (field, part) in fields.iter().zip(parts) {
                    out.insert((*field).to_string(), Value::from(part.display()));
                }
            }
            other => {
                if let Some(v) = other.json() {
                    for field in fields {
                        out.insert((*field).to_string(), v.clone());
                    }
                }
            }
        }
        out
    }

    fn apply_parser(&self, parser: ResponseParser, out: &mut Map<String, Value>) {
        match (parser, &self.value) {
            (ResponseParser::Frequency, DecodedValue::Int(hz)) => {
                out.insert("freq_hz".to_string(), Value::from(*hz));
                out.insert(
                    "freq_formatted".to_string(),
                    Value::from(format::frequency_display(*hz)),
                );
            }
            (ResponseParser::Mode, DecodedValue::Enum { label, .. }) => {
                out.insert("mode".to_string(), Value::from(label.as_str()));
            }
            (ResponseParser::Apf, DecodedValue::Compound(parts)) => {
                for part in parts {
                    let key = match part.name {
                        "mode" => "apf_mode",
                        "bandwidth" => "apf_bandwidth",
                        _ => continue,
                    };
                    out.insert(key.to_string(), Value::from(part.display()));
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operators_round_trip() {
        for c in ['/', '+', '-', '~', '^', '>', '\\'] {
            let kind = OperationKind::from_operator(c).unwrap();
            assert_eq!(kind.operator(), Some(c));
        }
        assert_eq!(OperationKind::from_operator('x'), None);
        assert_eq!(OperationKind::Set.operator(), None);
    }

    #[test]
    fn frequency_projection() {
        let cmd = parse("FA00014060000;").unwrap();
        let ui = cmd.ui_update();
        assert_eq!(ui["freq_hz"], 14_060_000);
        assert_eq!(ui["freq_formatted"], "14.060.000");
        assert_eq!(ui["vfo_a_freq"], 14_060_000);
        assert_eq!(ui["vfo_a_freq_hz"], 14_060_000);
    }

    #[test]
    fn mode_projection_uses_sub_fields() {
        let cmd = parse("MD$3;").unwrap();
        let ui = cmd.ui_update();
        assert_eq!(ui["mode"], "CW");
        assert_eq!(ui["mode_b"], "CW");
        assert!(!ui.contains_key("mode_a"));
    }

    #[test]
    fn apf_projection_splits_two_characters() {
        let ui = parse("AP12;").unwrap().ui_update();
        assert_eq!(ui["apf_mode"], "ON");
        assert_eq!(ui["apf_bandwidth"], "150Hz");

        let ui = parse("AP$01;").unwrap().ui_update();
        assert_eq!(ui["apf_mode_sub"], "OFF");
        assert_eq!(ui["apf_bandwidth_sub"], "50Hz");
    }

    #[test]
    fn unknown_enum_key_is_labelled() {
        let ui = parse("GT7;").unwrap().ui_update();
        assert_eq!(ui["agc_mode"], "Unknown (7)");
    }

    #[test]
    fn get_projects_nothing() {
        assert!(parse("FA;").unwrap().ui_update().is_empty());
    }
}
