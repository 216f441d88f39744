use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sensorgraph_core::config::{parse_timezone, Settings};
use sensorgraph_core::source::{FileSource, HttpSource, ReadingSource};
use sensorgraph_core::storage::{select_sink, PlatformClass};
use sensorgraph_core::Dashboard;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;
use commands::export::{handle_export_command, ExportArgs};
use commands::show::{handle_show_command, ShowArgs};

#[derive(Parser, Debug)]
#[command(author, version, about = "Particle counter and differential pressure dashboard", long_about = None)]
struct Cli {
    /// TOML settings file; `SENSORGRAPH_*` environment variables still apply on top.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Read a saved JSON response instead of calling the endpoint.
    #[arg(long, global = true, conflicts_with = "endpoint")]
    input: Option<PathBuf>,

    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// IANA timezone for labels and exported times.
    #[arg(long, global = true)]
    timezone: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch once and print the channel averages and the chart window.
    Show(ShowArgs),
    /// Fetch once and export the full dataset or a single chart.
    Export(ExportArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut settings = Settings::load(cli.config.as_deref()).context("failed to load settings")?;
    if let Some(endpoint) = cli.endpoint {
        settings.endpoint = endpoint;
    }
    if let Some(timezone) = cli.timezone.as_deref() {
        settings.timezone = parse_timezone(timezone)?;
    }
    if let Command::Export(args) = &cli.command {
        apply_export_overrides(&mut settings, args)?;
    }

    let source: Arc<dyn ReadingSource> = match cli.input {
        Some(path) => Arc::new(FileSource::new(path)),
        None => Arc::new(
            HttpSource::new(settings.endpoint.clone(), settings.request_timeout)
                .context("failed to build HTTP client")?,
        ),
    };
    info!(source = %source.describe(), platform = %settings.platform, "starting");

    let dashboard = Dashboard::new(source, select_sink(&settings), &settings);

    match cli.command {
        Command::Show(args) => handle_show_command(&dashboard, args).await,
        Command::Export(args) => handle_export_command(&dashboard, args).await,
    }
}

/// `--dest` grants a directory up front; `--platform` forces the delivery path.
fn apply_export_overrides(settings: &mut Settings, args: &ExportArgs) -> Result<()> {
    if let Some(platform) = args.platform.as_deref() {
        settings.platform = PlatformClass::try_from(platform).map_err(anyhow::Error::msg)?;
    }
    if let Some(dest) = &args.dest {
        match settings.platform {
            PlatformClass::DirectoryGrant => settings.export_dir = Some(dest.clone()),
            PlatformClass::PrivateShare => settings.private_dir = dest.clone(),
        }
    }
    Ok(())
}
