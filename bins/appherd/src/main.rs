use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use appherd_common::ManagedPath;
use appherd_managed_process::Launcher;
use appherd_process_management::{
    config::DEFAULT_CONFIG_FILE, EntryStatus, Settings, SupervisionRegistry, TextPathStore,
};

mod session;

/// appherd - start, watch and stop a list of applications as a herd
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Settings file path (JSON)
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print managed entries with their state
    List,
    /// Add paths to the managed list (order preserved)
    Add {
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Remove one path from the managed list
    Remove { path: String },
    /// Remove every path from the managed list
    Clear,
    /// Write a fresh settings file
    InitConfig { path: PathBuf },
    /// Interactive supervisor reading commands from stdin (default)
    Session,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    initialize_logging(args.debug)?;

    match args.command.unwrap_or(Command::Session) {
        Command::InitConfig { path } => {
            let settings = Settings::init_config(&path)?;
            println!(
                "Created {} (managed paths in {})",
                path.display(),
                settings.rules_path
            );
        }
        Command::List => {
            let (_, mut registry) = load(&args.config)?;
            print_entries(&registry.list_entries());
        }
        Command::Add { paths } => {
            let (_, mut registry) = load(&args.config)?;
            let added = registry.add(paths)?;
            println!("Added {} path(s)", added.len());
        }
        Command::Remove { path } => {
            let (_, mut registry) = load(&args.config)?;
            registry.remove(&ManagedPath::from(path.as_str()))?;
            println!("Removed {}", path);
        }
        Command::Clear => {
            let (_, mut registry) = load(&args.config)?;
            registry.remove_all()?;
            println!("Removed all paths");
        }
        Command::Session => {
            let (settings, registry) = load(&args.config)?;
            session::run(&settings, registry).await?;
        }
    }

    Ok(())
}

fn initialize_logging(debug: bool) -> Result<()> {
    let level = if debug { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn load(config: &Path) -> Result<(Settings, SupervisionRegistry)> {
    info!("Config file: {}", config.display());
    let settings = Settings::load_or_init(config)?;
    let registry = open_registry(&settings)?;
    Ok((settings, registry))
}

fn open_registry(settings: &Settings) -> Result<SupervisionRegistry> {
    let store = TextPathStore::open(settings.rules_path())
        .with_context(|| format!("Cannot open managed-path list {}", settings.rules_path))?;

    let launcher = Launcher::new(Arc::new(settings.resolver()))
        .with_release_policy(settings.release_policy())
        .with_requery_interval(settings.liveness_requery_interval);

    let registry = SupervisionRegistry::open(store, launcher)?;
    info!(
        "Managing {} paths from {}",
        registry.len(),
        settings.rules_path
    );
    Ok(registry)
}

pub(crate) fn print_entries(entries: &[EntryStatus]) {
    if entries.is_empty() {
        println!("(no managed paths)");
        return;
    }

    for (i, entry) in entries.iter().enumerate() {
        let pid = entry
            .pid
            .map(|pid| format!(" [PID {}]", pid))
            .unwrap_or_default();
        println!("{:>3}. {:<10} {}{}", i + 1, entry.state(), entry.path, pid);
    }
}
