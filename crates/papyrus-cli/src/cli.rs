//! CLI command definitions and argument parsing.

use crate::config::OutputFormat;
use clap::{Parser, Subcommand};
use papyrus_domain::ExtractionVariant;
use std::path::PathBuf;

/// Papyrus - Extract legislative initiatives and normative updates from official bulletins.
#[derive(Debug, Parser)]
#[command(name = "papyrus")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path (default: ~/.papyrus/config.toml)
    #[arg(short, long, global = true, env = "PAPYRUS_CONFIG")]
    pub config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace); RUST_LOG wins when set
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
}

impl From<CliFormat> for OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => OutputFormat::Table,
            CliFormat::Json => OutputFormat::Json,
        }
    }
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run extraction over a collection
    Extract(ExtractArgs),

    /// Print the distribution of extracted records in a collection
    Summary(SummaryArgs),
}

/// Arguments for the extract command.
#[derive(Debug, Clone, Parser)]
pub struct ExtractArgs {
    /// Collection to process (e.g., BOCG)
    #[arg(short = 'C', long)]
    pub collection: String,

    /// Earliest publication date, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<String>,

    /// Latest publication date, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<String>,

    /// Maximum number of documents
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Re-extract documents that already carry a result
    #[arg(long)]
    pub force: bool,

    /// Documents processed concurrently (overrides [batch] concurrency)
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Extraction variant (overrides [taxonomy] variant)
    #[arg(long, value_enum)]
    pub variant: Option<VariantArg>,

    /// Print the collection's distribution summary after the run
    #[arg(long)]
    pub summary: bool,
}

/// Arguments for the summary command.
#[derive(Debug, Clone, Parser)]
pub struct SummaryArgs {
    /// Collection to summarize
    #[arg(short = 'C', long)]
    pub collection: String,
}

/// Extraction variant argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum VariantArg {
    /// Legislative initiatives (parliamentary bulletins)
    Legislative,
    /// Normative updates (official gazettes)
    Normative,
}

impl From<VariantArg> for ExtractionVariant {
    fn from(variant: VariantArg) -> Self {
        match variant {
            VariantArg::Legislative => ExtractionVariant::LegislativeInitiatives,
            VariantArg::Normative => ExtractionVariant::NormativeUpdates,
        }
    }
}
