//! # CLI Layer
//!
//! The CLI layer is the **only** place that:
//! - Knows about stdout and stderr
//! - Installs the tracing subscriber
//! - Decides process exit codes
//!
//! ## Responsibilities
//!
//! 1. **Argument Parsing**: clap turns shell arguments into [`Commands`]
//! 2. **Context Setup**: layered [`StoreConfig`] plus flag overrides, anchored on the cwd
//! 3. **Dispatch**: one handler per subcommand
//! 4. **Output**: pretty JSON on stdout, exit code per error kind

use super::handlers::{self, AppState, Outcome};
use super::setup::{Cli, Commands};
use anyhow::{Context, Result};
use clap::Parser;
use dashstore::{ErrorKind, StoreConfig, StoreError};
use tracing::warn;
use tracing_subscriber::EnvFilter;

pub const EXIT_PARTIAL: i32 = 2;

pub fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(&cli)?;
    let state = AppState::new(config);
    let outcome = dispatch(&state, cli.command)?;

    let text = serde_json::to_string_pretty(&outcome.value)?;
    println!("{}", text);

    if outcome.complete {
        Ok(0)
    } else {
        warn!("operation completed partially");
        Ok(EXIT_PARTIAL)
    }
}

fn dispatch(state: &AppState, command: Commands) -> Result<Outcome> {
    let outcome = match command {
        Commands::Init => handlers::init(state)?,
        Commands::Collections => handlers::collections(state)?,
        Commands::List { collection } => handlers::list(state, &collection)?,
        Commands::Get { collection, id } => handlers::get(state, &collection, &id)?,
        Commands::Create {
            collection,
            document,
            head,
            text_ids,
        } => handlers::create(state, &collection, &document, head, text_ids)?,
        Commands::Update {
            collection,
            id,
            fields,
        } => handlers::update(state, &collection, &id, &fields)?,
        Commands::Delete { collection, id } => handlers::delete(state, &collection, &id)?,
        Commands::Replace {
            collection,
            documents,
        } => handlers::replace(state, &collection, &documents)?,
        Commands::Backup { collections } => handlers::backup(state, &collections)?,
        Commands::Backups => handlers::backups(state)?,
        Commands::Restore { archive } => handlers::restore(state, &archive)?,
    };
    Ok(outcome)
}

/// Environment, then `--config`, then the user file, then defaults; flags win
/// over all of them. Relative directories are anchored on the current directory.
fn load_config(cli: &Cli) -> Result<StoreConfig> {
    let cwd = std::env::current_dir().context("cannot determine the current directory")?;
    let mut config = StoreConfig::load(cli.config.as_deref())?;
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(dir) = &cli.backup_dir {
        config.backup_dir = dir.clone();
    }
    Ok(config.resolve(&cwd))
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    // A subscriber may already be installed when embedded; keep the existing one.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Map a failure onto the documented exit codes.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    let store_error = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<StoreError>());
    match store_error.map(StoreError::kind) {
        Some(ErrorKind::NotFound) => 3,
        Some(ErrorKind::Validation) => 4,
        Some(ErrorKind::CorruptData) => 5,
        Some(ErrorKind::Conflict) => 6,
        Some(ErrorKind::Io) => 7,
        None => 1,
    }
}
