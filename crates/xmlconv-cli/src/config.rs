//! Command-line configuration.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `XMLCONV_LOG_LEVEL` | warn | Log level |
//! | `XMLCONV_REJECT_DOCTYPE` | false | Refuse documents carrying a DOCTYPE |
//! | `XMLCONV_MAX_DEPTH` | 256 | Maximum element nesting depth |

use clap::{Args, Parser, Subcommand};
use encoding_rs::Encoding;
use std::path::{Path, PathBuf};
use xmlconv::{DoctypePolicy, ParserConfig};

/// Configuration for the `xmlconv` binary.
#[derive(Debug, Clone, Parser)]
#[command(name = "xmlconv")]
#[command(about = "Flatten and check XML payloads with hardened parsing")]
pub struct CliConfig {
    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "XMLCONV_LOG_LEVEL", default_value = "warn", global = true)]
    pub log_level: String,

    /// Refuse any document carrying a DOCTYPE declaration.
    #[arg(long, env = "XMLCONV_REJECT_DOCTYPE", global = true)]
    pub reject_doctype: bool,

    /// Maximum element nesting depth.
    #[arg(long, env = "XMLCONV_MAX_DEPTH", default_value = "256", global = true)]
    pub max_depth: usize,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print the root's child elements as key/value pairs.
    Flatten {
        #[command(flatten)]
        input: InputArgs,

        /// Print a JSON object instead of `key=value` lines.
        #[arg(long)]
        json: bool,
    },

    /// Exit non-zero if the document is malformed or rejected.
    Check {
        #[command(flatten)]
        input: InputArgs,
    },
}

/// Where a document is read from and how its bytes are decoded.
#[derive(Debug, Clone, Args)]
pub struct InputArgs {
    /// Input file; omitted or `-` reads standard input.
    pub file: Option<PathBuf>,

    /// Charset label such as GBK or UTF-16LE (default: BOM sniffing, then UTF-8).
    #[arg(long)]
    pub charset: Option<String>,
}

impl InputArgs {
    /// The input file, or `None` for standard input.
    pub fn path(&self) -> Option<&Path> {
        self.file.as_deref().filter(|path| *path != Path::new("-"))
    }

    /// Resolves the charset label.
    pub fn encoding(&self) -> Result<Option<&'static Encoding>, String> {
        match &self.charset {
            None => Ok(None),
            Some(label) => Encoding::for_label(label.trim().as_bytes())
                .map(Some)
                .ok_or_else(|| format!("Unknown charset label: {}", label)),
        }
    }
}

impl CliConfig {
    /// The input arguments of the selected subcommand.
    pub fn input(&self) -> &InputArgs {
        match &self.command {
            Command::Flatten { input, .. } | Command::Check { input } => input,
        }
    }

    /// Builds the parser configuration from the global options.
    pub fn parser_config(&self) -> ParserConfig {
        let doctype = if self.reject_doctype {
            DoctypePolicy::Reject
        } else {
            DoctypePolicy::Permit
        };
        ParserConfig::default()
            .doctype(doctype)
            .max_depth(self.max_depth)
    }

    /// Validates the configuration.
    ///
    /// Returns a list of validation errors, or Ok(()) if valid.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.max_depth == 0 {
            errors.push("Max depth cannot be 0".to_string());
        }

        if let Err(e) = self.input().encoding() {
            errors.push(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliConfig {
        CliConfig::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_stdin_when_file_omitted_or_dash() {
        assert_eq!(parse(&["xmlconv", "check"]).input().path(), None);
        assert_eq!(parse(&["xmlconv", "check", "-"]).input().path(), None);
        assert_eq!(
            parse(&["xmlconv", "check", "a.xml"]).input().path(),
            Some(Path::new("a.xml"))
        );
    }

    #[test]
    fn test_unknown_charset_fails_validation() {
        let config = parse(&["xmlconv", "flatten", "--charset", "klingon"]);
        let errors = config.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("klingon")));
    }

    #[test]
    fn test_zero_depth_fails_validation() {
        let config = parse(&["xmlconv", "--max-depth", "0", "check"]);
        assert!(config.validate().is_err());
    }
}
