//! ai-helper CLI - expands `//ai` comments into subtasks

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cli_lib::{cmd, logging};
use helper_core::{config, Config};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// ai-helper - Watch source files and expand `//ai` task comments with a local model
#[derive(Parser)]
#[command(name = "ai-helper")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: ~/.ai_helper/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log to the console only
    #[arg(long, global = true)]
    no_log_file: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch a directory and expand markers as files change (default)
    Watch {
        /// Directory to watch (default: current directory)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Expand markers already present before watching
        #[arg(long)]
        initial_scan: bool,
    },
    /// Expand markers in the given files once and exit
    Process {
        /// Files to process
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Expand markers in every watched file under a directory once
    Scan {
        /// Directory to scan (default: current directory)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Only list files with pending markers
        #[arg(long)]
        dry_run: bool,
    },
    /// Manage configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show all configuration values
    List,
    /// Get a single value
    Get {
        /// Config key (e.g., temperature)
        key: String,
    },
    /// Set a single value
    Set {
        /// Config key (e.g., temperature)
        key: String,
        /// New value
        value: String,
    },
    /// Show config file path
    Path {
        /// Create the file with defaults if it does not exist
        #[arg(long)]
        create: bool,
    },
    /// Print an example config file
    Example,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => path,
        None => config::config_file_path()?,
    };
    let command = cli.command.unwrap_or(Commands::Watch {
        root: None,
        initial_scan: false,
    });

    // Config commands only print; they never write the log file
    let log_dir = if cli.no_log_file || matches!(command, Commands::Config(_)) {
        None
    } else {
        Some(config::log_dir()?)
    };
    let _log = logging::init(log_dir.as_deref(), cli.verbose)?;

    match command {
        Commands::Watch { root, initial_scan } => {
            cmd::watch::run(load_config(&config_path)?, root, initial_scan).await
        }
        Commands::Process { files } => {
            cmd::process::run(load_config(&config_path)?, &files).await
        }
        Commands::Scan { root, dry_run } => {
            cmd::scan::run(load_config(&config_path)?, root, dry_run).await
        }
        Commands::Config(command) => match command {
            ConfigCommands::List => cmd::config::run_list(&config_path),
            ConfigCommands::Get { key } => cmd::config::run_get(&config_path, &key),
            ConfigCommands::Set { key, value } => {
                cmd::config::run_set(&config_path, &key, &value)
            }
            ConfigCommands::Path { create } => cmd::config::run_path(&config_path, create),
            ConfigCommands::Example => cmd::config::run_example(),
        },
    }
}

fn load_config(path: &Path) -> Result<Arc<Config>> {
    let config = config::load_from(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    Ok(Arc::new(config))
}
