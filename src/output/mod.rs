//! Output formatting for diff results

mod json;
mod terminal;

use std::io::Write;

use anyhow::Result;

use crate::config::OutputFormat;
use crate::diff::{DiffResult, DiffStats, Differ, RowReport};
use crate::model::Table;

pub use json::JsonOutput;
pub use terminal::TerminalOutput;

/// One side of a diff as it is shown to the user
#[derive(Debug, Clone, Copy)]
pub struct Side<'a> {
    pub name: &'a str,
    pub table: &'a Table,
}

/// A diff result together with everything derived from it for display
pub struct Report<'a> {
    pub table: &'a str,
    pub left: Side<'a>,
    pub right: Side<'a>,
    pub result: &'a DiffResult,
    pub rows: RowReport,
    pub stats: DiffStats,
}

impl<'a> Report<'a> {
    /// Classify `result` with the left schema, which is also the schema the
    /// rows were compared with.
    pub fn build(
        differ: &Differ,
        table: &'a str,
        left: Side<'a>,
        right: Side<'a>,
        result: &'a DiffResult,
    ) -> crate::error::Result<Self> {
        let schema = &left.table.schema;
        Ok(Self {
            table,
            left,
            right,
            result,
            rows: differ.explain(schema, &result.rows)?,
            stats: result.stats(schema)?,
        })
    }
}

/// Trait for output formatters
pub trait OutputFormatter {
    /// Render a report to a writer
    fn render(&self, report: &Report<'_>, writer: &mut dyn Write) -> Result<()>;
}

/// Factory for creating output formatters
pub struct OutputFactory;

impl OutputFactory {
    /// Create an output formatter based on format type
    pub fn create(format: OutputFormat, stats_only: bool) -> Box<dyn OutputFormatter> {
        match format {
            OutputFormat::Terminal => Box::new(TerminalOutput::new().with_stats_only(stats_only)),
            OutputFormat::Json => Box::new(JsonOutput::new().with_stats_only(stats_only)),
        }
    }
}

/// Render a report to stdout
pub fn render_to_stdout(report: &Report<'_>, format: OutputFormat, stats_only: bool) -> Result<()> {
    let formatter = OutputFactory::create(format, stats_only);
    let mut stdout = std::io::stdout().lock();
    formatter.render(report, &mut stdout)?;
    stdout.flush()?;
    Ok(())
}
