//! Rmcoll command implementation.

use super::{parse_matches, render_usage, Command, Context};
use crate::error::{CommandError, CommandResult};
use clap::{FromArgMatches, Parser};
use litedoc_core::{CollectionSpec, CoreError, Database};
use tracing::info;

/// Arguments of `rmcoll`.
#[derive(Debug, Parser)]
#[command(
    name = "rmcoll",
    no_binary_name = true,
    about = "Deletes collections",
    after_help = "WARNING: This permanently deletes all documents in the collection!"
)]
pub struct RmCollArgs {
    /// Collection name in the default scope, or `<scope_name>/<collection_name>`
    #[arg(value_name = "COLLECTION_PATH", required = true)]
    paths: Vec<String>,
}

/// Deletes one collection given as `name` or `scope/name`.
///
/// Returns the line to print.
pub fn run(db: &Database, path: &str) -> CommandResult<String> {
    let spec = CollectionSpec::from_path(path)
        .map_err(|e| CommandError::usage(format!("Invalid collection path '{path}': {e}")))?;
    if !db.has_collection(&spec) {
        return Err(CommandError::CollectionNotFound {
            collection: spec.to_string(),
        });
    }
    info!("Deleting collection {spec}");
    db.delete_collection(&spec).map_err(|e| match e {
        CoreError::CollectionNotFound { .. } => CommandError::CollectionNotFound {
            collection: spec.to_string(),
        },
        e => CommandError::store(format!("Couldn't delete collection '{path}'"), e),
    })?;
    Ok(format!(
        "Deleted collection '{}/{}'.",
        spec.scope(),
        spec.name()
    ))
}

/// The `rmcoll` command.
pub struct RmCollCommand;

impl Command for RmCollCommand {
    fn name(&self) -> &'static str {
        "rmcoll"
    }

    fn summary(&self) -> &'static str {
        "Delete collections and all their documents"
    }

    fn usage(&self) -> String {
        render_usage::<RmCollArgs>()
    }

    fn run_subcommand(&self, ctx: &mut Context<'_>, args: &[String]) -> CommandResult<()> {
        let Some(matches) = parse_matches::<RmCollArgs>(ctx, args)? else {
            return Ok(());
        };
        let parsed = RmCollArgs::from_arg_matches(&matches)
            .map_err(|e| CommandError::usage(e.to_string()))?;
        // No transaction spans several paths; the first failure stops the rest.
        for path in &parsed.paths {
            let line = run(ctx.db, path)?;
            writeln!(ctx.out, "{line}")?;
        }
        Ok(())
    }
}
