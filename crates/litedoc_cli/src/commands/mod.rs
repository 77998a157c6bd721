//! CLI command implementations.
//!
//! Every subcommand implements [`Command`] and is looked up by name in the
//! [`Registry`]. The dispatcher in `main.rs` opens the database and hands the
//! remaining arguments to [`Command::run_subcommand`].

pub mod cat;
pub mod mkcoll;
pub mod put;
pub mod rm;
pub mod rmcoll;

use crate::error::{CommandError, CommandResult};
use clap::error::ErrorKind;
use clap::{ArgMatches, CommandFactory};
use litedoc_core::{CollectionSpec, Database};
use std::collections::BTreeMap;
use std::io::Write;

/// What a command runs against.
pub struct Context<'a> {
    /// The open, writeable database.
    pub db: &'a Database,
    /// Where normal output goes (stdout in the binary).
    pub out: &'a mut dyn Write,
}

/// A subcommand.
pub trait Command {
    /// Name typed on the command line.
    fn name(&self) -> &'static str;

    /// One-line description shown by `help`.
    fn summary(&self) -> &'static str;

    /// Full usage text.
    fn usage(&self) -> String;

    /// Runs the command with the arguments that followed its name.
    fn run_subcommand(&self, ctx: &mut Context<'_>, args: &[String]) -> CommandResult<()>;
}

/// Name → command table.
pub struct Registry {
    commands: BTreeMap<&'static str, Box<dyn Command>>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            commands: BTreeMap::new(),
        }
    }

    /// Registry holding every built-in command.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(put::PutCommand));
        registry.register(Box::new(rm::RmCommand));
        registry.register(Box::new(rmcoll::RmCollCommand));
        registry.register(Box::new(mkcoll::MkCollCommand));
        registry.register(Box::new(cat::CatCommand));
        registry
    }

    /// Adds a command, replacing any previous one with the same name.
    pub fn register(&mut self, command: Box<dyn Command>) {
        self.commands.insert(command.name(), command);
    }

    /// Looks a command up by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        self.commands.get(name).map(|c| c.as_ref())
    }

    /// Iterates commands in name order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Command> {
        self.commands.values().map(|c| c.as_ref())
    }

    /// Text printed by `help` without arguments.
    #[must_use]
    pub fn overview(&self) -> String {
        let mut text = String::from("Commands:\n");
        for command in self.iter() {
            text.push_str(&format!("  {:<8} {}\n", command.name(), command.summary()));
        }
        text.push_str("\nRun `litedoc help <command>` for details.\n");
        text
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Parses a command's arguments with its clap definition.
///
/// Returns `Ok(None)` when `--help` was requested; the help text has already
/// been written to `ctx.out`.
pub(crate) fn parse_matches<A: CommandFactory>(
    ctx: &mut Context<'_>,
    args: &[String],
) -> CommandResult<Option<ArgMatches>> {
    match A::command().try_get_matches_from(args) {
        Ok(matches) => Ok(Some(matches)),
        Err(e) if e.kind() == ErrorKind::DisplayHelp => {
            write!(ctx.out, "{}", e.render())?;
            Ok(None)
        }
        Err(e) => Err(CommandError::usage(e.render().to_string().trim_end())),
    }
}

/// Renders a command's clap help.
pub(crate) fn render_usage<A: CommandFactory>() -> String {
    A::command().render_help().to_string()
}

/// Resolves a `--collection` value.
pub(crate) fn collection_from_arg(path: Option<&str>) -> CommandResult<CollectionSpec> {
    match path {
        None => Ok(CollectionSpec::default_collection()),
        Some(path) => CollectionSpec::from_path(path)
            .map_err(|e| CommandError::usage(format!("Invalid collection path '{path}': {e}"))),
    }
}
