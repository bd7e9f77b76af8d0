//! Command-line front end for xmlconv.
//!
//! The binary reads a document from a file or standard input, decodes it with
//! the requested charset and runs it through the hardened parser:
//!
//! - `xmlconv flatten [FILE] [--json]` prints the root's child elements;
//! - `xmlconv check [FILE]` fails with the parser's error when the document is
//!   malformed or rejected.

pub mod config;

pub use config::{CliConfig, Command, InputArgs};

use anyhow::Context;
use encoding_rs::Encoding;
use std::io::{Read, Write};
use tracing::{debug, info};
use xmlconv::{ParserConfig, decode_bytes, flat, parse_document};

/// Initializes the tracing subscriber for logging.
///
/// Logs go to standard error so command output stays machine-readable.
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("xmlconv={},xmlconv_cli={}", level, level)));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Reads the selected input completely.
pub fn read_input(input: &InputArgs) -> anyhow::Result<Vec<u8>> {
    match input.path() {
        Some(path) => {
            debug!(path = %path.display(), "Reading input file");
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
        }
        None => {
            debug!("Reading standard input");
            let mut bytes = Vec::new();
            std::io::stdin()
                .read_to_end(&mut bytes)
                .context("Failed to read standard input")?;
            Ok(bytes)
        }
    }
}

/// Flattens a document and writes the map to `out`.
pub fn flatten<W: Write>(
    bytes: &[u8],
    charset: Option<&'static Encoding>,
    parser: &ParserConfig,
    json: bool,
    mut out: W,
) -> anyhow::Result<()> {
    let text = decode_bytes(bytes, charset)?;
    let map = flat::decode_flat(&text, parser)?;
    info!(entries = map.len(), "Flattened document");

    if json {
        serde_json::to_writer_pretty(&mut out, &map)?;
        writeln!(out)?;
    } else {
        for (key, value) in &map {
            writeln!(out, "{}={}", key, value)?;
        }
    }
    Ok(())
}

/// Parses a document and reports its root element.
pub fn check<W: Write>(
    bytes: &[u8],
    charset: Option<&'static Encoding>,
    parser: &ParserConfig,
    mut out: W,
) -> anyhow::Result<()> {
    let text = decode_bytes(bytes, charset)?;
    let doc = parse_document(&text, parser)?;
    match doc.root() {
        Some(root) => writeln!(
            out,
            "ok: <{}> with {} child element(s)",
            root.name(),
            root.child_elements().count()
        )?,
        None => writeln!(out, "ok: no root element")?,
    }
    Ok(())
}

/// Runs the configured subcommand against `bytes`.
pub fn run<W: Write>(config: &CliConfig, bytes: &[u8], out: W) -> anyhow::Result<()> {
    let parser = config.parser_config();
    let charset = config.input().encoding().map_err(anyhow::Error::msg)?;

    match &config.command {
        Command::Flatten { json, .. } => flatten(bytes, charset, &parser, *json, out),
        Command::Check { .. } => check(bytes, charset, &parser, out),
    }
}
