use super::registry::{descriptor, longest_prefix};
use super::{
    CommandDescriptor, CompoundField, CompoundPart, DecodedValue, EnumTable, OperationKind,
    OperationSpec, ParsedCommand, ValueType,
};
use crate::error::CatError;

/// Parses and validates one command.
///
/// `text` may carry surrounding whitespace and any number of trailing `;`.
/// A `$` anywhere addresses the sub receiver.
pub fn parse(text: &str) -> Result<ParsedCommand, CatError> {
    let clean = text.trim().trim_end_matches(';');
    if clean.is_empty() {
        return Err(CatError::Empty);
    }
    let display = clean.starts_with('#');
    let sub_receiver = clean.contains('$');
    let clean: String = clean.chars().filter(|&c| c != '$').collect();

    let (descriptor, mut kind, raw_value) = split_operation(&clean)?;

    // Bare action commands (`TX;`, `FC;`) only define a SET without a value.
    if kind == OperationKind::Get && !descriptor.supports(OperationKind::Get) {
        if let Some(set) = descriptor.operation(OperationKind::Set) {
            if !set.takes_value() {
                kind = OperationKind::Set;
            }
        }
    }

    let spec = descriptor
        .operation(kind)
        .ok_or_else(|| CatError::UnsupportedOperation {
            command: descriptor.code.to_string(),
            operation: kind.as_str().to_string(),
        })?;

    if sub_receiver && !descriptor.sub_receiver {
        return Err(CatError::UnsupportedSubReceiver(descriptor.code.to_string()));
    }

    let value = if kind == OperationKind::Set && !raw_value.is_empty() {
        decode_value(&raw_value, spec)
    } else {
        DecodedValue::None
    };
    check_range(descriptor, kind, spec, &value)?;

    Ok(ParsedCommand {
        original: text.to_string(),
        code: descriptor.code,
        kind,
        sub_receiver,
        display,
        raw_value,
        value,
        descriptor,
    })
}

fn split_operation(
    clean: &str,
) -> Result<(&'static CommandDescriptor, OperationKind, String), CatError> {
    if let Some(last) = clean.chars().last() {
        if let Some(kind) = OperationKind::from_operator(last) {
            let base = &clean[..clean.len() - last.len_utf8()];
            let d = descriptor(base).ok_or_else(|| CatError::UnknownCommand(base.to_string()))?;
            return Ok((d, kind, String::new()));
        }
    }

    let d = longest_prefix(clean).ok_or_else(|| CatError::UnknownCommand(clean.to_string()))?;
    let value = clean[d.code.len()..].to_string();
    let kind = if value.is_empty() {
        OperationKind::Get
    } else {
        OperationKind::Set
    };
    Ok((d, kind, value))
}

fn decode_value(raw: &str, spec: &OperationSpec) -> DecodedValue {
    match spec.value {
        ValueType::None | ValueType::Text => DecodedValue::Text(raw.to_string()),
        ValueType::Int { .. } => match raw.trim().parse::<i64>() {
            Ok(v) => DecodedValue::Int(v),
            Err(_) => DecodedValue::Raw(raw.to_string()),
        },
        ValueType::Enum(table) => DecodedValue::Enum {
            key: raw.to_string(),
            label: enum_label(table, raw),
        },
        ValueType::Compound(fields) => decode_compound(raw, fields),
    }
}

pub(crate) fn enum_label(table: EnumTable, key: &str) -> String {
    table
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, label)| (*label).to_string())
        .unwrap_or_else(|| format!("Unknown ({key})"))
}

/// Splits a fixed-width compound value. Falls back to `Raw` when the width
/// does not match.
fn decode_compound(raw: &str, fields: &[CompoundField]) -> DecodedValue {
    let fixed: usize = fields.iter().map(|f| f.width).sum();
    let has_rest = fields.iter().any(|f| f.width == 0);
    let len = raw.chars().count();
    let fits = if has_rest { len >= fixed } else { len == fixed };
    if !fits || !raw.is_ascii() {
        return DecodedValue::Raw(raw.to_string());
    }

    let mut parts = Vec::with_capacity(fields.len());
    let mut pos = 0usize;
    for f in fields {
        let end = if f.width == 0 { raw.len() } else { pos + f.width };
        let key = &raw[pos..end];
        parts.push(CompoundPart {
            name: f.name,
            key: key.to_string(),
            label: f.labels.map(|t| enum_label(t, key)),
        });
        pos = end;
    }
    DecodedValue::Compound(parts)
}

fn check_range(
    d: &CommandDescriptor,
    kind: OperationKind,
    spec: &OperationSpec,
    value: &DecodedValue,
) -> Result<(), CatError> {
    if kind != OperationKind::Set {
        return Ok(());
    }
    let (ValueType::Int { min, max }, Some(v)) = (spec.value, value.as_int()) else {
        return Ok(());
    };
    let below = min.is_some_and(|m| v < m);
    let above = max.is_some_and(|m| v > m);
    if below || above {
        return Err(CatError::OutOfRange {
            command: d.code.to_string(),
            value: v,
            min: min.unwrap_or(i64::MIN),
            max: max.unwrap_or(i64::MAX),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sub_receiver_set() {
        let cmd = parse("AG$050;").unwrap();
        assert_eq!(cmd.code, "AG");
        assert_eq!(cmd.kind, OperationKind::Set);
        assert!(cmd.sub_receiver);
        assert_eq!(cmd.value, DecodedValue::Int(50));
        assert_eq!(cmd.raw_value, "050");
        assert_eq!(cmd.original, "AG$050;");
    }

    #[test]
    fn toggle_has_no_value() {
        let cmd = parse("FT/;").unwrap();
        assert_eq!(cmd.kind, OperationKind::Toggle);
        assert_eq!(cmd.value, DecodedValue::None);
        assert!(cmd.raw_value.is_empty());
    }

    #[test]
    fn get_without_value() {
        let cmd = parse("MD$;").unwrap();
        assert_eq!(cmd.kind, OperationKind::Get);
        assert!(cmd.sub_receiver);
    }

    #[test]
    fn out_of_range_is_rejected() {
        assert_eq!(
            parse("KS200;"),
            Err(CatError::OutOfRange {
                command: "KS".to_string(),
                value: 200,
                min: 8,
                max: 100
            })
        );
        assert!(parse("KS100;").is_ok());
        assert!(parse("#REF-201;").is_err());
        assert!(parse("#REF-110;").is_ok());
    }

    #[test]
    fn unknown_and_unsupported() {
        assert!(matches!(parse("ZZ1;"), Err(CatError::UnknownCommand(_))));
        assert!(matches!(parse("PING;"), Err(CatError::UnknownCommand(_))));
        assert!(matches!(
            parse("FA/;"),
            Err(CatError::UnsupportedOperation { .. })
        ));
        assert_eq!(
            parse("KS$20;"),
            Err(CatError::UnsupportedSubReceiver("KS".to_string()))
        );
        assert_eq!(parse(" ; "), Err(CatError::Empty));
    }

    #[test]
    fn display_namespace_longest_match() {
        let cmd = parse("#SPN$50000;").unwrap();
        assert!(cmd.display);
        assert!(cmd.sub_receiver);
        assert_eq!(cmd.code, "#SPN");
        assert_eq!(cmd.value, DecodedValue::Int(50_000));
    }

    #[test]
    fn band_stack_operators() {
        assert_eq!(parse("BN^;").unwrap().kind, OperationKind::BandStackNext);
        assert_eq!(parse("BN$>;").unwrap().kind, OperationKind::BandStackRecall);
        assert_eq!(parse("VT\\;").unwrap().kind, OperationKind::Special);
        assert_eq!(parse("BL~;").unwrap().kind, OperationKind::Normalize);
    }

    #[test]
    fn bare_action_commands_are_sets() {
        assert_eq!(parse("TX;").unwrap().kind, OperationKind::Set);
        assert_eq!(parse("FC$;").unwrap().kind, OperationKind::Set);
        assert!(matches!(
            parse("TM;"),
            Err(CatError::UnsupportedOperation { .. })
        ));
    }

    #[test]
    fn non_numeric_int_value_falls_back_to_raw() {
        let cmd = parse("AGxx;").unwrap();
        assert_eq!(cmd.value, DecodedValue::Raw("xx".to_string()));
    }

    #[test]
    fn compound_width_mismatch_is_raw() {
        assert_eq!(
            parse("AP123;").unwrap().value,
            DecodedValue::Raw("123".to_string())
        );
        match parse("KYRCQ CQ").unwrap().value {
            DecodedValue::Compound(parts) => {
                assert_eq!(parts[0].label.as_deref(), Some("Repeat"));
                assert_eq!(parts[1].key, "CQ CQ");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
