use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use gcp_inventory::config::Config;
use gcp_inventory::gcp::client::GcpClient;
use gcp_inventory::inventory::{self, CollectOptions, RunOptions};
use gcp_inventory::operation;
use std::path::{Path, PathBuf};
use tracing::Instrument;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// List resources of every configured GCP service in every region
#[derive(Parser, Debug)]
#[command(name = "gcp-inventory", version, about, long_about = None)]
struct Args {
    /// Path to the services sheet JSON file
    #[arg(required_unless_present = "list_operations")]
    services_sheet: Option<PathBuf>,

    /// Path to the output JSON file
    #[arg(required_unless_present = "list_operations")]
    output_file: Option<PathBuf>,

    /// GCP project to inventory
    #[arg(short, long)]
    project: Option<String>,

    /// Configuration file (defaults to <config dir>/gcp-inventory/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (RUST_LOG takes precedence)
    #[arg(long, value_enum, default_value = "info")]
    log_level: LogLevel,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Keep records for calls that succeeded with an empty result
    #[arg(long)]
    keep_empty: bool,

    /// Pretty-print the output document
    #[arg(long)]
    pretty: bool,

    /// Print every supported service.function and exit
    #[arg(long)]
    list_operations: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

fn setup_logging(level: LogLevel, log_file: Option<&Path>) -> Result<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_filter()));

    let (non_blocking, guard) = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create log directory {}", parent.display())
                })?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_appender::non_blocking(file)
        },
        None => tracing_appender::non_blocking(std::io::stderr()),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(log_file.is_none())
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    Ok(guard)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level, args.log_file.as_deref())?;

    if args.list_operations {
        for key in operation::get_all_operation_keys() {
            let description = key
                .split_once('.')
                .and_then(|(service, function)| operation::get_operation(service, function).ok())
                .and_then(|(_, op)| op.description.as_deref())
                .unwrap_or("");
            println!("{:<45} {}", key, description);
        }
        return Ok(());
    }

    let (Some(services_sheet), Some(output_file)) =
        (args.services_sheet.as_deref(), args.output_file.as_deref())
    else {
        anyhow::bail!("Both <SERVICES_SHEET> and <OUTPUT_FILE> are required");
    };

    let config = Config::load(args.config.as_deref())?;
    let project = config.effective_project(args.project.as_deref()).context(
        "No GCP project configured. \
         Set GOOGLE_CLOUD_PROJECT, add project_id to the config or use --project",
    )?;

    let run_id = Uuid::new_v4();
    let span = tracing::info_span!("inventory", %run_id, %project);

    let options = RunOptions {
        collect: CollectOptions {
            metadata_stripping: config.metadata_stripping,
            keep_empty: args.keep_empty || config.keep_empty,
        },
        regions: config.regions.clone(),
        pretty: args.pretty || config.pretty,
    };

    async {
        tracing::info!("gcp-inventory {} started", env!("CARGO_PKG_VERSION"));

        let client = GcpClient::new(
            &project,
            config.effective_user_agent(),
            config.endpoint_override.as_deref(),
        )
        .await?;

        inventory::run(&client, services_sheet, output_file, &options).await?;
        Ok::<(), anyhow::Error>(())
    }
    .instrument(span)
    .await
}
