use crate::{build_info, logging::BANNER_TARGET};

pub fn log_startup_banner() {
    let version = build_info::version();
    let os = std::env::consts::OS;
    let arch = std::env::consts::ARCH;
    let timestamp = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    let build = build_info::build_string();

    tracing::info!(
        target: BANNER_TARGET,
        version,
        os,
        arch,
        timestamp = %timestamp,
        build = %build,
        "startup"
    );
}
