//! Rm command implementation (`put --delete`).

use super::put::{self, build_request, PutMode};
use super::{parse_matches, render_usage, Command, Context};
use crate::error::{CommandError, CommandResult};
use clap::{FromArgMatches, Parser};

/// Arguments of `rm`.
#[derive(Debug, Parser)]
#[command(
    name = "rm",
    no_binary_name = true,
    about = "Deletes a document (same as `put --delete`)"
)]
pub struct RmArgs {
    /// Purges the document (doesn't leave a tombstone)
    #[arg(long)]
    purge: bool,

    /// Collection as `name` or `scope/name` (default `_default`)
    #[arg(long, value_name = "PATH")]
    collection: Option<String>,

    /// Document ID
    #[arg(value_name = "DOCID")]
    doc_id: String,
}

/// The `rm` command.
pub struct RmCommand;

impl Command for RmCommand {
    fn name(&self) -> &'static str {
        "rm"
    }

    fn summary(&self) -> &'static str {
        "Delete a document"
    }

    fn usage(&self) -> String {
        render_usage::<RmArgs>()
    }

    fn run_subcommand(&self, ctx: &mut Context<'_>, args: &[String]) -> CommandResult<()> {
        let Some(matches) = parse_matches::<RmArgs>(ctx, args)? else {
            return Ok(());
        };
        let parsed =
            RmArgs::from_arg_matches(&matches).map_err(|e| CommandError::usage(e.to_string()))?;
        let mode = if parsed.purge {
            PutMode::Purge
        } else {
            PutMode::Delete
        };
        let request = build_request(
            mode,
            parsed.collection.as_deref(),
            parsed.doc_id,
            &[],
            Vec::new(),
        )?;
        let outcome = put::run(ctx.db, &request)?;
        writeln!(ctx.out, "{outcome}")?;
        Ok(())
    }
}
