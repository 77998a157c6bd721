//! Cat command implementation.

use super::{collection_from_arg, parse_matches, render_usage, Command, Context};
use crate::error::{CommandError, CommandResult};
use clap::{FromArgMatches, Parser};
use litedoc_core::{CoreError, Document};
use serde_json::{Map, Value};

/// Arguments of `cat`.
#[derive(Debug, Parser)]
#[command(name = "cat", no_binary_name = true, about = "Displays document bodies as JSON")]
pub struct CatArgs {
    /// Include `_id`, `_rev` and `_sequence` metadata
    #[arg(long)]
    rev: bool,

    /// Collection as `name` or `scope/name` (default `_default`)
    #[arg(long, value_name = "PATH")]
    collection: Option<String>,

    /// Document IDs
    #[arg(value_name = "DOCID", required = true)]
    doc_ids: Vec<String>,
}

/// Renders a live document as one line of JSON.
fn render(doc: &Document, with_meta: bool) -> String {
    let mut map = Map::new();
    if with_meta {
        map.insert("_id".into(), Value::from(doc.id()));
        if let Some(rev_id) = doc.rev_id() {
            map.insert("_rev".into(), Value::from(rev_id.as_str()));
        }
        if let Some(sequence) = doc.sequence() {
            map.insert("_sequence".into(), Value::from(sequence.as_u64()));
        }
    }
    if let Some(body) = doc.body() {
        for (key, value) in body.as_map() {
            map.insert(key.clone(), value.clone());
        }
    }
    Value::Object(map).to_string()
}

/// The `cat` command.
pub struct CatCommand;

impl Command for CatCommand {
    fn name(&self) -> &'static str {
        "cat"
    }

    fn summary(&self) -> &'static str {
        "Display documents"
    }

    fn usage(&self) -> String {
        render_usage::<CatArgs>()
    }

    fn run_subcommand(&self, ctx: &mut Context<'_>, args: &[String]) -> CommandResult<()> {
        let Some(matches) = parse_matches::<CatArgs>(ctx, args)? else {
            return Ok(());
        };
        let parsed =
            CatArgs::from_arg_matches(&matches).map_err(|e| CommandError::usage(e.to_string()))?;
        let spec = collection_from_arg(parsed.collection.as_deref())?;
        for doc_id in &parsed.doc_ids {
            let doc = ctx.db.get_document(&spec, doc_id).map_err(|e| match e {
                CoreError::CollectionNotFound { .. } => CommandError::CollectionNotFound {
                    collection: spec.to_string(),
                },
                e => CommandError::store("Couldn't read document", e),
            })?;
            if !doc.is_live() {
                return Err(CommandError::DocumentNotFound {
                    doc_id: doc_id.clone(),
                });
            }
            writeln!(ctx.out, "{}", render(&doc, parsed.rev))?;
        }
        Ok(())
    }
}
