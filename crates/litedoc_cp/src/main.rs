//! `litedoc-cp`: copies documents between LiteDoc databases, JSON files and
//! directories of JSON files.

use clap::Parser;
use litedoc_core::CollectionSpec;
use litedoc_cp::endpoint::DEFAULT_ID_PROPERTY;
use litedoc_cp::{copy, Endpoint, EndpointError, EndpointOptions, UnrecognizedLocator};
use std::io;
use std::process::ExitCode;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter.
const LOG_ENV: &str = "LITEDOC_LOG";

/// Copy documents between LiteDoc databases (`*.litedoc`), newline-delimited
/// JSON files (`*.json`) and directories of JSON files (`dir/`).
#[derive(Parser, Debug)]
#[command(name = "litedoc-cp")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Where to copy from
    source: String,

    /// Where to copy to
    destination: String,

    /// The destination must already exist
    #[arg(long)]
    existing: bool,

    /// Stop after this many documents
    #[arg(long, value_name = "N")]
    limit: Option<usize>,

    /// JSON property holding the document ID
    #[arg(long, value_name = "PROP", default_value = DEFAULT_ID_PROPERTY)]
    jsonid: String,

    /// Collection to read or write in databases (`scope/name` or `name`)
    #[arg(long, value_name = "PATH")]
    collection: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Error)]
enum Failure {
    #[error(transparent)]
    Locator(#[from] UnrecognizedLocator),
    #[error(transparent)]
    Endpoint(#[from] EndpointError),
    #[error("{0}")]
    Usage(String),
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    match run(&args) {
        Ok(message) => {
            println!("{message}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            if let Failure::Locator(UnrecognizedLocator { hint: Some(hint), .. }) = &e {
                eprintln!("HINT: {hint}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<String, Failure> {
    let options = options_from(args)?;
    let mut source = Endpoint::create(&args.source)?;
    let mut destination = Endpoint::create(&args.destination)?;
    let stats = copy(&mut source, &mut destination, &options, args.limit)?;
    Ok(format!(
        "Copied {} document(s) from {source} to {destination}.",
        stats.copied
    ))
}

fn options_from(args: &Args) -> Result<EndpointOptions, Failure> {
    let collection = match &args.collection {
        Some(path) => CollectionSpec::from_path(path).map_err(|e| Failure::Usage(e.to_string()))?,
        None => CollectionSpec::default_collection(),
    };
    if args.jsonid.is_empty() {
        return Err(Failure::Usage("--jsonid must not be empty".to_string()));
    }
    Ok(EndpointOptions {
        existing: args.existing,
        id_property: args.jsonid.clone(),
        collection,
        ..EndpointOptions::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use litedoc_cp::Hint;
    use std::fs;

    fn parse(words: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("litedoc-cp").chain(words.iter().copied())).unwrap()
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn options_from_flags() {
        let args = parse(&["a.json", "b.litedoc", "--jsonid", "key", "--collection", "s/c"]);
        let options = options_from(&args).unwrap();
        assert_eq!(options.id_property, "key");
        assert_eq!(options.collection, CollectionSpec::new("s", "c").unwrap());
        assert!(!options.existing);

        let args = parse(&["a.json", "b.litedoc"]);
        assert_eq!(options_from(&args).unwrap().id_property, "_id");
    }

    #[test]
    fn unrecognized_destination_carries_hint() {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("in.json");
        fs::write(&source, "{\"_id\":\"a\"}\n").unwrap();
        let args = parse(&[source.to_str().unwrap(), "nothing"]);

        let err = run(&args).unwrap_err();
        assert!(matches!(
            err,
            Failure::Locator(UnrecognizedLocator {
                hint: Some(Hint::DirectoryNeedsSeparator),
                ..
            })
        ));
    }

    #[test]
    fn reports_copied_count() {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("in.json");
        fs::write(&source, "{\"_id\":\"a\"}\n{\"_id\":\"b\"}\n").unwrap();
        let destination = format!("{}/", temp.path().join("out").display());
        let args = parse(&[source.to_str().unwrap(), &destination]);

        let message = run(&args).unwrap();
        assert!(message.starts_with("Copied 2 document(s) from "));
        assert!(temp.path().join("out").join("b.json").is_file());
    }
}
