pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

pub fn build_source() -> &'static str {
    option_env!("K4BRIDGE_BUILD_SOURCE").unwrap_or("unknown")
}

pub fn profile() -> &'static str {
    option_env!("K4BRIDGE_PROFILE").unwrap_or("release")
}

pub fn target() -> &'static str {
    option_env!("K4BRIDGE_TARGET").unwrap_or("")
}

pub fn git_commit() -> Option<&'static str> {
    option_env!("K4BRIDGE_GIT_COMMIT")
}

pub fn git_dirty() -> Option<bool> {
    option_env!("K4BRIDGE_GIT_DIRTY").and_then(|s| match s {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    })
}

/// `source[@commit][+dirty] profile target`, or the `K4BRIDGE_BUILD`
/// override when set at compile time.
pub fn build_string() -> String {
    if let Some(build) = option_env!("K4BRIDGE_BUILD") {
        return build.to_string();
    }
    let mut out = build_source().to_string();
    if let Some(commit) = git_commit() {
        out.push('@');
        out.push_str(commit);
    }
    if git_dirty() == Some(true) {
        out.push_str("+dirty");
    }
    out.push(' ');
    out.push_str(profile());
    let target = target();
    if !target.is_empty() {
        out.push(' ');
        out.push_str(target);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_string_names_profile() {
        let s = build_string();
        assert!(!s.is_empty());
        if option_env!("K4BRIDGE_BUILD").is_none() {
            assert!(s.contains(profile()));
        }
    }
}
