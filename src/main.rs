mod config;
mod controls;
mod render;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};

use socklog_logs::{ConnectionEvent, ConnectionManager, ConnectionStatus, LogStore};

use crate::config::{FileConfig, OutputFormat, Settings};
use crate::controls::ControlReader;
use crate::render::Renderer;

/// How long to wait for the close handshake on exit
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

/// Socklog - tail a WebSocket stream of JSON log messages
#[derive(Parser, Debug)]
#[command(name = "socklog")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// WebSocket URL (ws:// or wss://), may also come from the config file
    #[arg(value_name = "URL")]
    url: Option<String>,

    /// Maximum number of retained log entries [default: 1000]
    #[arg(long)]
    buffer_size: Option<usize>,

    /// Do not reconnect after the connection closes
    #[arg(long)]
    no_reconnect: bool,

    /// Delay between reconnect attempts in milliseconds [default: 3000]
    #[arg(long, value_name = "MS")]
    reconnect_interval: Option<u64>,

    /// Reconnect attempts before giving up [default: 10]
    #[arg(long, value_name = "N")]
    max_reconnect_attempts: Option<u32>,

    /// Indent width for expanded entries [default: 4]
    #[arg(long)]
    indent: Option<usize>,

    /// Pretty-print JSON entries
    #[arg(long)]
    expanded: bool,

    /// Initial search term
    #[arg(long)]
    search: Option<String>,

    /// Output format
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    /// TOML config file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = run_app(args).await;

    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }

    result
}

async fn run_app(args: Args) -> Result<()> {
    let file = match &args.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let settings = Settings::resolve(&args, file).context("invalid configuration")?;
    debug!("resolved settings: {:?}", settings);

    let store = LogStore::new(settings.buffer_size);
    let mut store_events = store.subscribe();

    let mut manager = ConnectionManager::new(settings.connection.clone());
    let mut connection_events = manager.subscribe();

    let mut renderer = Renderer::new(std::io::stdout(), settings.format, settings.render.clone());
    let mut controls = ControlReader::new();

    if let Some(term) = settings.render.search_term() {
        store.set_search(term);
    }

    info!("tailing {}", settings.connection.url);
    manager.connect();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = manager.process() => {}

            Some(event) = connection_events.recv() => match event {
                ConnectionEvent::StatusChanged(status) => {
                    renderer.status_changed(status, &store).context("failed to write output")?;
                }
                ConnectionEvent::Log(entry) => store.add(entry),
            },

            Some(event) = store_events.recv() => {
                renderer.handle(&event, &store).context("failed to write output")?;
            }

            Some(control) = controls.recv() => {
                if control.apply(&store).is_break() {
                    break;
                }
            }

            _ = &mut ctrl_c => {
                debug!("interrupted");
                break;
            }
        }
    }

    manager.disconnect();
    let _ = tokio::time::timeout(SHUTDOWN_GRACE, async {
        while matches!(
            manager.status(),
            ConnectionStatus::Connecting | ConnectionStatus::Connected
        ) {
            manager.process().await;
        }
    })
    .await;

    Ok(())
}
