use anyhow::Context;
use clap::Parser;
use k4bridge_server::{app, banner, logging, shutdown, state::AppState};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(
    name = "k4bridge-server",
    version,
    about = "Bridge a K4 transceiver's remote link to web clients."
)]
struct Args {
    /// JSON config file. Built-in defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose logging for the bridge crates (ignored when RUST_LOG is set)
    #[arg(long)]
    debug: bool,

    /// Also write daily rolling logs into this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Bind host override
    #[arg(long)]
    host: Option<String>,

    /// Bind port override
    #[arg(long)]
    port: Option<u16>,

    /// Radio host override
    #[arg(long)]
    radio_host: Option<String>,

    /// Radio port override
    #[arg(long)]
    radio_port: Option<u16>,
}

impl Args {
    fn load_config(&self) -> anyhow::Result<k4bridge_core::config::Config> {
        let mut cfg = match &self.config {
            Some(path) => k4bridge_core::config::load_from_file(path)?,
            None => {
                tracing::info!("no config file given; using defaults");
                k4bridge_core::config::Config::default()
            }
        };
        if let Some(host) = &self.host {
            cfg.server.host = host.clone();
        }
        if let Some(port) = self.port {
            cfg.server.port = port;
        }
        if let Some(host) = &self.radio_host {
            cfg.radio.host = host.clone();
        }
        if let Some(port) = self.radio_port {
            cfg.radio.port = port;
        }
        cfg.validate().context("validate config with overrides")?;
        Ok(cfg)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _log_guards = logging::init(&logging::LoggingConfig {
        debug: args.debug,
        log_dir: args.log_dir.clone(),
        ..Default::default()
    })?;
    banner::log_startup_banner();

    let cfg = args.load_config()?;
    let state = Arc::new(AppState::new(cfg));
    tokio::spawn(shutdown::shutdown_signal(state.shutdown.clone()));

    app::serve(state).await
}
