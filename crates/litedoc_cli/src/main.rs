//! LiteDoc CLI
//!
//! Command-line tools for inspecting and editing LiteDoc databases.
//!
//! # Commands
//!
//! - `put` - Create, update, delete or purge a document
//! - `rm` - Delete a document
//! - `rmcoll` - Delete collections
//! - `mkcoll` - Create collections
//! - `cat` - Display documents
//! - `help` - Show usage

mod commands;
mod error;

use clap::{Parser, Subcommand};
use commands::{Context, Registry};
use error::{report, CommandError, CommandResult};
use litedoc_core::{Config, Database};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter.
const LOG_ENV: &str = "LITEDOC_LOG";

/// LiteDoc command-line database tools.
#[derive(Parser)]
#[command(name = "litedoc")]
#[command(author, version, about, long_about = None)]
#[command(disable_help_subcommand = true, subcommand_value_name = "COMMAND")]
struct Cli {
    /// Path to the database directory (`*.litedoc`)
    #[arg(short, long)]
    path: Option<PathBuf>,

    /// Create the database if it doesn't exist
    #[arg(long)]
    create: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Invocation,
}

#[derive(Subcommand)]
enum Invocation {
    /// Command name followed by its arguments
    #[command(external_subcommand)]
    Run(Vec<String>),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let Invocation::Run(words) = cli.command;
    let Some((name, args)) = words.split_first() else {
        eprintln!("Error: missing command");
        return ExitCode::FAILURE;
    };

    let registry = Registry::with_builtins();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match dispatch(
        &registry,
        cli.path.as_deref(),
        cli.create,
        name,
        args,
        &mut out,
    ) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let _ = out.flush();
            eprintln!("{}", report(&e));
            ExitCode::FAILURE
        }
    }
}

/// Opens the database and runs one command.
fn dispatch(
    registry: &Registry,
    path: Option<&Path>,
    create: bool,
    name: &str,
    args: &[String],
    out: &mut dyn Write,
) -> CommandResult<()> {
    if name == "help" {
        return help(registry, args, out);
    }
    let command = registry
        .get(name)
        .ok_or_else(|| CommandError::usage(format!("Unknown command `{name}`; try `help`")))?;
    let path = path.ok_or_else(|| {
        CommandError::usage(format!("Database path required for {name} (use --path)"))
    })?;

    tracing::info!("Opening database {:?}", path);
    let config = Config::default().create_if_missing(create);
    let db = Database::open_with_config(path, config).map_err(|e| {
        CommandError::store(format!("Couldn't open database {}", path.display()), e)
    })?;

    let mut ctx = Context { db: &db, out };
    command.run_subcommand(&mut ctx, args)?;
    db.close()
        .map_err(|e| CommandError::store("Couldn't close database", e))?;
    Ok(())
}

fn help(registry: &Registry, names: &[String], out: &mut dyn Write) -> CommandResult<()> {
    if names.is_empty() {
        write!(out, "{}", registry.overview())?;
        return Ok(());
    }
    for name in names {
        let command = registry
            .get(name)
            .ok_or_else(|| CommandError::usage(format!("Unknown command `{name}`")))?;
        write!(out, "{}", command.usage())?;
    }
    Ok(())
}
