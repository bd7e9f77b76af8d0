//! xmlconv command-line tool.

use clap::Parser;
use tracing::info;
use xmlconv_cli::{CliConfig, init_logging, read_input, run};

fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();
    init_logging(&config.log_level);

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    info!(
        reject_doctype = config.reject_doctype,
        max_depth = config.max_depth,
        "Starting xmlconv"
    );

    let bytes = read_input(config.input())?;
    run(&config, &bytes, std::io::stdout().lock())
}
