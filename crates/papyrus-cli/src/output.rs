//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use papyrus_batch::{ranked, DistributionSummary, RunStatistics, Summary};
use std::collections::BTreeMap;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format run statistics.
    pub fn format_stats(&self, stats: &RunStatistics) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(stats)?),
            OutputFormat::Table => Ok(self.format_stats_table(stats)),
        }
    }

    fn format_stats_table(&self, stats: &RunStatistics) -> String {
        let mut builder = Builder::default();
        builder.push_record(["Metric", "Value"]);
        builder.push_record(["Run".to_string(), stats.run_id.to_string()]);
        builder.push_record(["Collection".to_string(), stats.collection.clone()]);
        builder.push_record(["Documents processed".to_string(), stats.documents_processed.to_string()]);
        builder.push_record(["Initiatives found".to_string(), stats.initiatives_found.to_string()]);
        builder.push_record([
            "Documents with initiatives".to_string(),
            stats.documents_with_initiatives.to_string(),
        ]);
        builder.push_record(["Skipped".to_string(), stats.documents_skipped.to_string()]);
        builder.push_record(["Without content".to_string(), stats.documents_without_content.to_string()]);
        builder.push_record(["Errors".to_string(), stats.errors.to_string()]);
        for (kind, count) in &stats.errors_by_kind {
            builder.push_record([format!("  {}", kind), count.to_string()]);
        }
        builder.push_record(["Total tokens".to_string(), stats.total_tokens.to_string()]);
        builder.push_record(["Processing time".to_string(), format!("{:.2}s", stats.processing_time)]);

        let mut output = Self::render(builder);
        output.push('\n');
        output.push_str(&self.run_verdict(stats));
        output
    }

    fn run_verdict(&self, stats: &RunStatistics) -> String {
        if stats.cancelled {
            self.warning("Run cancelled; remaining documents were not dispatched")
        } else if stats.is_clean() {
            self.success(&format!("Processed {} document(s)", stats.documents_processed))
        } else {
            self.error(&format!(
                "{} of {} document(s) failed",
                stats.errors, stats.documents_processed
            ))
        }
    }

    /// Format a distribution summary.
    pub fn format_summary(&self, summary: &Summary) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(summary)?),
            OutputFormat::Table => Ok(match summary {
                Summary::NoData { collection } => {
                    self.warning(&format!("No initiatives found in collection {}", collection))
                }
                Summary::Distribution(distribution) => self.format_distribution_table(distribution),
            }),
        }
    }

    fn format_distribution_table(&self, distribution: &DistributionSummary) -> String {
        let mut sections = vec![self.info(&format!(
            "{}: {} initiative(s) in {} document(s)",
            distribution.collection, distribution.total_initiatives, distribution.documents
        ))];

        let dimensions: [(&str, &BTreeMap<String, usize>); 4] = [
            ("Tipo de iniciativa", &distribution.by_type),
            ("Sector", &distribution.by_sector),
            ("Proponente", &distribution.by_proponente),
            ("Marco geográfico", &distribution.by_marco_geografico),
        ];
        for (title, counts) in dimensions {
            let mut builder = Builder::default();
            builder.push_record([title, "Count"]);
            for (value, count) in ranked(counts) {
                builder.push_record([value.to_string(), count.to_string()]);
            }
            sections.push(Self::render(builder));
        }

        sections.join("\n\n")
    }

    fn render(builder: Builder) -> String {
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}
