use super::registry::descriptor;
use super::OperationKind;
use crate::error::CatError;

/// Builds wire text for a registered command, e.g.
/// `build("AG", OperationKind::Set, "050", true)` gives `AG$050;`.
pub fn build(
    code: &str,
    kind: OperationKind,
    value: &str,
    sub_receiver: bool,
) -> Result<String, CatError> {
    let d = descriptor(code).ok_or_else(|| CatError::UnknownCommand(code.to_string()))?;
    let spec = d
        .operation(kind)
        .ok_or_else(|| CatError::UnsupportedOperation {
            command: code.to_string(),
            operation: kind.as_str().to_string(),
        })?;
    if sub_receiver && !d.sub_receiver {
        return Err(CatError::UnsupportedSubReceiver(code.to_string()));
    }
    Ok(spec
        .pattern
        .replace("{$}", if sub_receiver { "$" } else { "" })
        .replace("{value}", value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cat::parse;

    #[test]
    fn parse_then_build_round_trips() {
        for text in ["AG$050;", "FA00014060000;", "MD$3;", "#SPN50000;", "BN$^;", "FT/;"] {
            let cmd = parse(text).unwrap();
            let built = build(cmd.code, cmd.kind, &cmd.raw_value, cmd.sub_receiver).unwrap();
            assert_eq!(built, text);
        }
    }

    #[test]
    fn build_errors() {
        assert_eq!(
            build("ZZ", OperationKind::Set, "1", false),
            Err(CatError::UnknownCommand("ZZ".to_string()))
        );
        assert!(matches!(
            build("FA", OperationKind::Toggle, "", false),
            Err(CatError::UnsupportedOperation { .. })
        ));
        assert_eq!(
            build("FA", OperationKind::Get, "", true),
            Err(CatError::UnsupportedSubReceiver("FA".to_string()))
        );
    }

    #[test]
    fn special_with_value() {
        assert_eq!(
            build("FC", OperationKind::Special, "500", true).unwrap(),
            "FC$500;"
        );
    }
}
