//! Papyrus CLI - Batch extraction over legal bulletin collections.

use clap::Parser;
use papyrus_cli::commands;
use papyrus_cli::{init_logging, Cli, Command, Config, Formatter};

/// Exit code of a run that finished with per-document errors
const EXIT_DOCUMENT_ERRORS: i32 = 2;

#[tokio::main]
async fn main() {
    match run().await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run() -> papyrus_cli::Result<i32> {
    // Parse CLI arguments
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load(cli.config.as_deref())?;
    config.validate()?;

    // Determine output format
    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);
    let formatter = Formatter::new(format, !cli.no_color && config.settings.color);

    match cli.command {
        Command::Extract(args) => {
            let stats = commands::execute_extract(args, &config, &formatter).await?;
            Ok(if stats.is_clean() { 0 } else { EXIT_DOCUMENT_ERRORS })
        }
        Command::Summary(args) => {
            commands::execute_summary(args, &config, &formatter)?;
            Ok(0)
        }
    }
}
