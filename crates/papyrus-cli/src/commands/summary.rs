//! Summary command implementation.

use crate::cli::SummaryArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use papyrus_batch::summarize;
use papyrus_domain::traits::DocumentStore;
use papyrus_store::SqliteStore;
use std::fmt::Display;

/// Execute the summary command.
pub fn execute_summary(args: SummaryArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    if !config.store.path.exists() {
        return Err(CliError::Config(format!(
            "document store {} does not exist",
            config.store.path.display()
        )));
    }

    let store = SqliteStore::new(&config.store.path)?;
    println!("{}", render_summary(&store, &args.collection, formatter)?);
    Ok(())
}

/// Summarize a collection and format the result.
pub fn render_summary<S>(store: &S, collection: &str, formatter: &Formatter) -> Result<String>
where
    S: DocumentStore,
    S::Error: Display,
{
    let summary = summarize(store, collection)?;
    formatter.format_summary(&summary)
}
