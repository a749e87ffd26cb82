//! SSR Control Probe - command line entry point
//!
//! Sends one control command to a SoundScape Renderer and prints what comes back.

use anyhow::{Context, Result};
use clap::Parser;
use ssr_control_probe::config::{self, ProbeConfig};
use ssr_control_probe::{
    ControlChannelProbe, ControlCommand, MessageTerminator, RequestPayload, TransportAction,
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "ssr-probe", author, version, about = "Probe a SoundScape Renderer control port")]
struct Cli {
    /// Config file (TOML/JSON/YAML); defaults to the platform config dir
    #[arg(long)]
    config: Option<PathBuf>,
    /// Renderer host
    #[arg(long)]
    host: Option<String>,
    /// Renderer control port
    #[arg(long)]
    port: Option<u16>,
    /// Number of reads after the request is sent
    #[arg(long)]
    count: Option<usize>,
    /// Maximum bytes per read
    #[arg(long)]
    chunk_size: Option<usize>,
    /// Give up connecting after this many milliseconds
    #[arg(long)]
    connect_timeout_ms: Option<u64>,
    /// Count a read as empty if no data arrives within this many milliseconds
    #[arg(long)]
    read_timeout_ms: Option<u64>,
    /// Raw XML request to send instead of the configured payload
    #[arg(long, conflicts_with_all = ["azimuth", "transport"])]
    payload: Option<String>,
    /// Turn the reference (listener) to this azimuth in degrees
    #[arg(long, allow_negative_numbers = true, conflicts_with = "transport")]
    azimuth: Option<f32>,
    /// Transport action: start, stop or rewind
    #[arg(long)]
    transport: Option<TransportAction>,
    /// Terminator appended to --payload/--azimuth/--transport: newline or nul
    #[arg(long, default_value = "newline")]
    terminator: MessageTerminator,
}

impl Cli {
    fn apply(&self, config: &mut ProbeConfig) {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(count) = self.count {
            config.read_count = count;
        }
        if let Some(chunk_size) = self.chunk_size {
            config.max_chunk_size = chunk_size;
        }
        if self.connect_timeout_ms.is_some() {
            config.connect_timeout_ms = self.connect_timeout_ms;
        }
        if self.read_timeout_ms.is_some() {
            config.read_timeout_ms = self.read_timeout_ms;
        }
    }

    fn request(&self) -> Result<Option<RequestPayload>> {
        if let Some(xml) = &self.payload {
            return Ok(Some(RequestPayload::from_xml(xml, self.terminator)?));
        }
        let command = match (self.azimuth, self.transport) {
            (Some(azimuth), _) => ControlCommand::ReferenceOrientation { azimuth },
            (None, Some(action)) => ControlCommand::Transport(action),
            (None, None) => return Ok(None),
        };
        Ok(Some(RequestPayload::from_command(&command, self.terminator)))
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging (stderr, so stdout only carries received data)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ssr_control_probe=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    run_cli(Cli::parse()).await
}

/// Everything after logging setup; an `Err` here becomes a non-zero exit
async fn run_cli(cli: Cli) -> Result<()> {
    // Load configuration
    let mut config = config::load_config(cli.config.as_deref())?;
    cli.apply(&mut config);
    tracing::debug!(?config, "Configuration loaded");

    let mut settings = config.into_settings()?;
    if let Some(payload) = cli.request()? {
        settings.payload = payload;
    }

    let endpoint = settings.endpoint.clone();
    let probe = ControlChannelProbe::new(settings)?;
    probe
        .run(|chunk| println!("received data: {}", chunk))
        .await
        .with_context(|| format!("probe of {} failed", endpoint))?;

    Ok(())
}
