//! Mkcoll command implementation.

use super::{parse_matches, render_usage, Command, Context};
use crate::error::{CommandError, CommandResult};
use clap::{FromArgMatches, Parser};
use litedoc_core::CollectionSpec;
use tracing::info;

/// Arguments of `mkcoll`.
#[derive(Debug, Parser)]
#[command(name = "mkcoll", no_binary_name = true, about = "Creates collections")]
pub struct MkCollArgs {
    /// Collection name in the default scope, or `<scope_name>/<collection_name>`
    #[arg(value_name = "COLLECTION_PATH", required = true)]
    paths: Vec<String>,
}

/// The `mkcoll` command.
pub struct MkCollCommand;

impl Command for MkCollCommand {
    fn name(&self) -> &'static str {
        "mkcoll"
    }

    fn summary(&self) -> &'static str {
        "Create collections"
    }

    fn usage(&self) -> String {
        render_usage::<MkCollArgs>()
    }

    fn run_subcommand(&self, ctx: &mut Context<'_>, args: &[String]) -> CommandResult<()> {
        let Some(matches) = parse_matches::<MkCollArgs>(ctx, args)? else {
            return Ok(());
        };
        let parsed = MkCollArgs::from_arg_matches(&matches)
            .map_err(|e| CommandError::usage(e.to_string()))?;
        for path in &parsed.paths {
            let spec = CollectionSpec::from_path(path).map_err(|e| {
                CommandError::usage(format!("Invalid collection path '{path}': {e}"))
            })?;
            info!("Creating collection {spec}");
            let created = ctx
                .db
                .create_collection(&spec)
                .map_err(|e| CommandError::store(format!("Couldn't create collection '{path}'"), e))?;
            if created {
                writeln!(ctx.out, "Created collection '{spec}'.")?;
            } else {
                writeln!(ctx.out, "Collection '{spec}' already exists.")?;
            }
        }
        Ok(())
    }
}
