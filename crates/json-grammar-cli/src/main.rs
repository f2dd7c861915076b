//! `json-grammar` CLI — parse JSON documents with the combinator grammar.
//!
//! ## Usage
//!
//! ```sh
//! # Parse stdin and pretty-print the tree as JSON
//! echo '{"name":"Alice","scores":[95,87]}' | json-grammar parse
//!
//! # Parse a file, print compact text, write to a file
//! json-grammar parse -i data.json -o out.json --format compact
//!
//! # Show the raw syntax tree
//! json-grammar parse -i data.json --format debug
//!
//! # Check that a file parses, rejecting trailing input
//! json-grammar check -i data.json --strict
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, IsTerminal, Read};
use tracing::{debug, warn, Level};

#[derive(Parser)]
#[command(
    name = "json-grammar",
    version,
    about = "Parse JSON with a recursive combinator grammar"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log grammar runs to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a document and print its syntax tree
    Parse {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
        /// How to print the tree
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
        /// Reject input left over after the value
        #[arg(long)]
        strict: bool,
    },
    /// Report whether a document parses and how much of it was consumed
    Check {
        /// Input file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Reject input left over after the value
        #[arg(long)]
        strict: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    /// Pretty-printed JSON
    Json,
    /// Single-line JSON text
    Compact,
    /// Rust debug view of the tree
    Debug,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Parse {
            input,
            output,
            format,
            strict,
        } => {
            let text = read_input(input.as_deref())?;
            let tree = parse_document(&text, strict)?;
            let rendered = match format {
                Format::Json => serde_json::to_string_pretty(&tree)
                    .context("Failed to serialize syntax tree")?,
                Format::Compact => tree.to_string(),
                Format::Debug => format!("{tree:#?}"),
            };
            write_output(output.as_deref(), &format!("{rendered}\n"))?;
        }
        Commands::Check { input, strict } => {
            let text = read_input(input.as_deref())?;
            let consumed = if strict {
                json_grammar::parse_complete(&text).context("Failed to parse JSON")?;
                text.len()
            } else {
                let success = json_grammar::parse_prefix(&text).context("Failed to parse JSON")?;
                warn_on_leftover(success.rest());
                success.consumed
            };
            println!("ok ({} of {} bytes)", consumed, text.len());
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn parse_document(text: &str, strict: bool) -> Result<json_grammar::JsonValue> {
    if strict {
        return json_grammar::parse_complete(text).context("Failed to parse JSON");
    }
    let success = json_grammar::parse_prefix(text).context("Failed to parse JSON")?;
    warn_on_leftover(success.rest());
    Ok(success.value)
}

/// The grammar stops after the first value; say so when that left text behind.
fn warn_on_leftover(rest: &str) {
    let leftover = rest.trim_start();
    if !leftover.is_empty() {
        warn!(
            unparsed_bytes = leftover.len(),
            "input continues after the parsed value"
        );
    } else {
        debug!("input fully consumed");
    }
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            print!("{}", content);
        }
    }
    Ok(())
}
