use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use colored::Colorize;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use update_notifier::{ConfigStore, NotifierConfig, PackageVersion, Result, UpdateNotifier};

#[derive(Parser)]
#[command(name = "update-notifier")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Print a throttled notice when a newer version is published", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the registry and print a notice if an update is due (default)
    Check {
        /// Config file (defaults to <config_dir>/update-notifier/config.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Installed version to compare against (defaults to this binary's version)
        #[arg(long)]
        current: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("{}", format!("Error: failed to start runtime: {}", e).red());
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run_async(cli)) {
        eprintln!("{}", format!("Error: {:#}", e).red());
        std::process::exit(1);
    }
}

async fn run_async(cli: Cli) -> Result<()> {
    match cli.command.unwrap_or(Commands::Check {
        config: None,
        current: None,
    }) {
        Commands::Check { config, current } => {
            let config = match config {
                Some(path) => NotifierConfig::load_from(&path)?,
                None => NotifierConfig::load()?,
            };

            if !config.is_enabled() {
                tracing::debug!("update check disabled");
                return Ok(());
            }

            let version = current
                .map(PackageVersion::new)
                .unwrap_or_default();
            let store = ConfigStore::open(&config.store_name)?;

            let mut notifier = UpdateNotifier::new(version, config.registry_source(), store)
                .with_upgrade_hint(config.upgrade_hint());

            if let Err(e) = notifier.check_and_notify().await {
                tracing::warn!(error = %e, "update check failed");
                return Err(e);
            }
        }

        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "update-notifier", &mut io::stdout());
        }
    }

    Ok(())
}
