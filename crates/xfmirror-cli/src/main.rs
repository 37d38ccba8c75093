//! xfmirror - Xpressfeed postbox mirror
//!
//! Mirrors the latest config files, installers, full snapshots and change
//! files of every configured feed package from a remote postbox into a
//! local directory tree.

mod display;
mod json_output;
mod progress;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use console::{style, Term};
use display::{
    display_success, display_warning, print_scan, print_sync_summary, render_pipe, render_table,
    ReportFormat,
};
use json_output::{EstimateJson, OperationMetadata, SyncResultJson};
use progress::ProgressDisplay;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use xfmirror_config::{Config, ConfigLoader, LoggingConfig};
use xfmirror_engine::{
    transport_from_config, CancellationToken, DownloadOptions, Orchestrator, RunContext, ScanMode,
};
use xfmirror_types::WorkerCount;

/// xfmirror - Xpressfeed postbox mirror
#[derive(Parser)]
#[command(
    name = "xfmirror",
    version = env!("CARGO_PKG_VERSION"),
    about = "Mirror Xpressfeed postbox feeds into a local directory",
    long_about = "xfmirror scans a remote postbox over SFTP (or a mounted directory),\n\
                  selects the latest config files, installers, full snapshots and the\n\
                  change files since them, and downloads whatever is missing locally."
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Quiet mode - minimal output
    #[arg(short, long)]
    quiet: bool,

    /// Verbose mode - detailed output
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the remote and download every missing file
    Sync {
        /// Number of download workers
        #[arg(short, long)]
        workers: Option<usize>,
        /// Local destination root
        #[arg(long)]
        destination: Option<PathBuf>,
        /// Download into `<name>.part` and rename when complete
        #[arg(long)]
        staging: bool,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the files a sync would select
    Scan,
    /// Report the size of everything a sync would select
    Estimate {
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: ReportFormat,
        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show configuration
    Config {
        /// Show default configuration
        #[arg(long)]
        default: bool,
        /// Write the configuration to a file
        #[arg(long)]
        write: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let wants_default = matches!(cli.command, Commands::Config { default: true, .. });
    let loaded = if wants_default {
        Ok(Config::default())
    } else {
        load_config(cli.config.as_deref())
    };

    let logging = loaded
        .as_ref()
        .map(|config| config.logging.clone())
        .unwrap_or_default();
    let _guard = init_logging(cli.debug, cli.quiet, cli.verbose, &logging)?;
    let config = loaded?;

    info!("xfmirror v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Sync {
            workers,
            destination,
            staging,
            json,
        } => {
            sync_command(config, workers, destination, staging, json, cli.quiet).await?;
        }
        Commands::Scan => {
            scan_command(&config).await?;
        }
        Commands::Estimate { format, output } => {
            estimate_command(&config, format, output, cli.quiet).await?;
        }
        Commands::Config { default, write } => {
            config_command(&config, default, write)?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => ConfigLoader::load_from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => ConfigLoader::load_default().context("Failed to load configuration")?,
    };
    Ok(config)
}

fn init_logging(
    debug: bool,
    quiet: bool,
    verbose: bool,
    logging: &LoggingConfig,
) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::fmt::writer::BoxMakeWriter;
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else if quiet {
        "error"
    } else {
        logging.level.as_str()
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .context("Invalid log filter")?;

    let (writer, guard) = match &logging.file {
        Some(path) => {
            let file_name = path
                .file_name()
                .ok_or_else(|| anyhow!("logging.file {} has no file name", path.display()))?;
            let dir = path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(non_blocking), Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stderr), None),
    };

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_ansi(logging.file.is_none())
        .with_writer(writer);

    let installed = if logging.json_format {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    Ok(guard)
}

/// First Ctrl-C drains the run, the second exits immediately
fn install_interrupt_handler(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        display_warning(
            "Interrupt received, finishing in-flight downloads (press Ctrl-C again to exit now)",
        );
        token.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(130);
        }
    });
}

fn progress_hidden(quiet: bool) -> bool {
    quiet || !Term::stderr().is_term()
}

async fn sync_command(
    mut config: Config,
    workers: Option<usize>,
    destination: Option<PathBuf>,
    staging: bool,
    json: bool,
    quiet: bool,
) -> Result<()> {
    if workers.is_some() {
        config.workers.count = workers;
    }
    if destination.is_some() {
        config.local.destination = destination;
    }
    if staging {
        config.transfer.staging = true;
    }
    config.validate()?;
    config.require_remote()?;
    let options = DownloadOptions::from_config(&config)?;

    let transport = transport_from_config(&config.remote, config.transfer.buffer_size)?;
    let remote = transport.describe();
    let orchestrator = Orchestrator::from_config(transport, &config);

    if !quiet && !json {
        println!(
            "{} Mirroring {} into {} with {} workers",
            style("⟲").blue().bold(),
            style(&remote).cyan(),
            style(options.destination.display()).cyan(),
            options.workers.get()
        );
    }

    let display = Arc::new(ProgressDisplay::new(json || progress_hidden(quiet)));
    let ctx = RunContext::new(display.clone());
    install_interrupt_handler(ctx.token().clone());

    let result = orchestrator.sync(&options, &ctx).await;
    display.finish();
    let report = result?;

    if json {
        let output = SyncResultJson::new(OperationMetadata::new("sync", remote), &report);
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !quiet {
        print_sync_summary(&report);
    }
    Ok(())
}

async fn scan_command(config: &Config) -> Result<()> {
    config.require_remote()?;
    let transport = transport_from_config(&config.remote, config.transfer.buffer_size)?;
    let orchestrator = Orchestrator::from_config(transport, config);

    let ctx = RunContext::silent();
    install_interrupt_handler(ctx.token().clone());
    let outcome = orchestrator.scan(ScanMode::Dry, &ctx).await?;
    print_scan(&outcome);
    Ok(())
}

async fn estimate_command(
    config: &Config,
    format: ReportFormat,
    output: Option<PathBuf>,
    quiet: bool,
) -> Result<()> {
    config.require_remote()?;
    let transport = transport_from_config(&config.remote, config.transfer.buffer_size)?;
    let remote = transport.describe();
    let orchestrator = Orchestrator::from_config(transport, config);

    let ctx = RunContext::silent();
    install_interrupt_handler(ctx.token().clone());
    let report = orchestrator.estimate(&ctx).await?;

    let rendered = match format {
        ReportFormat::Table => render_table(&report),
        ReportFormat::Pipe => render_pipe(&report),
        ReportFormat::Json => {
            let json = EstimateJson::new(OperationMetadata::new("estimate", remote), &report);
            let mut text = serde_json::to_string_pretty(&json)?;
            text.push('\n');
            text
        }
    };

    match output {
        Some(path) => {
            std::fs::write(&path, rendered)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            if !quiet {
                display_success(&format!("Report written to {}", path.display()));
            }
        }
        None => print!("{}", rendered),
    }
    Ok(())
}

fn config_command(config: &Config, default: bool, write: Option<PathBuf>) -> Result<()> {
    if let Some(path) = write {
        ConfigLoader::save_to_file(config, &path)?;
        display_success(&format!("Configuration written to {}", path.display()));
        return Ok(());
    }

    let title = if default {
        "Default configuration:"
    } else {
        "Current configuration:"
    };
    println!("{} {}", style("⚙").blue().bold(), title);

    let mut shown = config.clone();
    if shown.remote.password.is_some() {
        shown.remote.password = Some("********".to_string());
    }
    print!(
        "{}",
        ConfigLoader::to_string_for(&shown, Path::new("xfmirror.yaml"))?
    );

    println!();
    println!(
        "Available cores: {}, default workers: {}",
        num_cpus::get(),
        WorkerCount::optimal().get()
    );
    Ok(())
}
