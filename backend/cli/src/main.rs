mod check_cmd;
mod config;
mod map_cmd;
mod migrate_cmd;
mod terminal_output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::error;

use config::Settings;
use ltconfig_config::Version;

#[derive(Parser)]
#[command(name = "ltconfig")]
#[command(about = "Migrate versioned ltConfig settings files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate a config file to a target schema version
    Migrate {
        /// Spec document (YAML)
        #[arg(short, long)]
        specs: PathBuf,
        /// Target schema version
        #[arg(short, long)]
        target: Version,
        /// Config file; defaults to ltconfig.conf in the config directory
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Print the migrated config instead of writing it
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a spec document
    Check {
        /// Spec document (YAML)
        #[arg(short, long)]
        specs: PathBuf,
        /// Also require a complete chain starting at this version
        #[arg(long, requires = "to")]
        from: Option<Version>,
        /// Also require a complete chain ending at this version
        #[arg(long, requires = "from")]
        to: Option<Version>,
    },
    /// Map one path pattern of a JSON settings file onto another
    Map {
        /// JSON settings file
        #[arg(short, long)]
        input: PathBuf,
        /// Source path pattern, e.g. `settings/*`
        #[arg(long)]
        from: String,
        /// Destination path pattern
        #[arg(long)]
        to: String,
        /// Fail on paths that do not resolve
        #[arg(long)]
        strict: bool,
    },
}

#[tokio::main]
async fn main() {
    let settings = Settings::from_env();
    ltconfig_logging::init_logger(settings.log_dir.as_deref(), &settings.log_level);

    let cli = Cli::parse();
    if let Err(e) = run(cli, &settings).await {
        error!("{e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, settings: &Settings) -> Result<()> {
    match cli.command {
        Commands::Migrate {
            specs,
            target,
            config,
            dry_run,
        } => {
            let config_path = settings.config_file(config);
            migrate_cmd::run(&config_path, &specs, target, dry_run).await
        }
        Commands::Check { specs, from, to } => {
            check_cmd::run(&specs, from.zip(to)).await
        }
        Commands::Map {
            input,
            from,
            to,
            strict,
        } => map_cmd::run(&input, &from, &to, strict).await,
    }
}
