use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use remote_updater::config::{UpdaterConfig, log_path};
use remote_updater::hooks::interceptor::OutboundRequest;
use remote_updater::updater::RemoteUpdater;
use remote_updater::version::types::{DetailArgs, PendingUpdates, PluginDetails};

#[derive(Parser)]
#[command(name = "remote-updater")]
#[command(version, about = "Check a plugin's custom update endpoint")]
struct Cli {
    /// Updater configuration (JSON)
    #[arg(short, long, global = true, default_value = "remote-updater.json")]
    config: PathBuf,

    /// Write logs to a file instead of stderr (default location when no path is given)
    #[arg(long, global = true, num_args = 0..=1)]
    log_file: Option<Option<PathBuf>>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the periodic update check and print the pending updates
    Check,
    /// Fetch the detail-view data for the plugin
    Info,
    /// Filter an outbound request (JSON) the way the host hook would
    Filter {
        /// URL the request is sent to
        #[arg(long)]
        url: String,
        /// Request file; stdin when omitted
        #[arg(long)]
        request: Option<PathBuf>,
    },
}

fn init_logging(
    verbose: bool,
    log_file: Option<Option<PathBuf>>,
) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));

    let Some(log_file) = log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    };

    let log_file = log_file.unwrap_or_else(log_path);
    let dir = log_file
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    let file_name = log_file
        .file_name()
        .context("Log file path has no file name")?;

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(Some(guard))
}

fn read_request(path: Option<&Path>) -> anyhow::Result<OutboundRequest> {
    let content = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut content = String::new();
            std::io::stdin().read_to_string(&mut content)?;
            content
        }
    };
    serde_json::from_str(&content).context("Invalid request JSON")
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = UpdaterConfig::from_file(&cli.config)?;
    let updater = RemoteUpdater::new(&config)?;
    let identity = updater.identity();

    let output = match cli.command {
        Command::Check => {
            let pending = PendingUpdates {
                checked: [(identity.full_id().to_string(), identity.version().to_string())]
                    .into_iter()
                    .collect(),
                ..Default::default()
            };
            serde_json::to_string_pretty(&updater.on_periodic_check(Some(pending)).await)?
        }
        Command::Info => {
            let details = updater
                .on_detail_request(
                    "plugin_information",
                    &DetailArgs::for_slug(identity.slug()),
                    PluginDetails::default(),
                )
                .await;
            serde_json::to_string_pretty(&details)?
        }
        Command::Filter { url, request } => {
            let request = read_request(request.as_deref())?;
            serde_json::to_string_pretty(&updater.filter_outbound_request(request, &url))?
        }
    };

    println!("{}", output);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(cli.verbose, cli.log_file.clone())?;

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(run(cli))
}
