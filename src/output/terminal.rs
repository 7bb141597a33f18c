//! Colored terminal output

use std::io::{IsTerminal, Write};

use anyhow::Result;
use termcolor::{Ansi, Color, ColorChoice, ColorSpec, NoColor, WriteColor};

use crate::diff::{CellChange, ColumnDiff};
use crate::model::{Column, Row, Table};

use super::{OutputFormatter, Report, Side};

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Terminal output with colors
pub struct TerminalOutput {
    color_choice: ColorChoice,
    stats_only: bool,
}

impl TerminalOutput {
    pub fn new() -> Self {
        Self {
            color_choice: ColorChoice::Auto,
            stats_only: false,
        }
    }

    pub fn with_color_choice(mut self, color_choice: ColorChoice) -> Self {
        self.color_choice = color_choice;
        self
    }

    pub fn with_stats_only(mut self, stats_only: bool) -> Self {
        self.stats_only = stats_only;
        self
    }

    fn use_color(&self) -> bool {
        match self.color_choice {
            ColorChoice::Always | ColorChoice::AlwaysAnsi => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => {
                std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
            }
        }
    }

    fn write_report<W: WriteColor>(&self, report: &Report<'_>, w: &mut W) -> Result<()> {
        write_header(w, report)?;

        if !report.result.has_diff() {
            writeln!(w, "No differences found.")?;
            return Ok(());
        }

        write_column_diff(w, &report.result.columns, report)?;
        write_summary(w, report)?;
        if self.stats_only {
            return Ok(());
        }

        write_rows(w, report.left, &report.rows.left_only, Color::Red)?;
        write_rows(w, report.right, &report.rows.right_only, Color::Green)?;
        write_modified_rows(w, report)?;
        Ok(())
    }
}

impl Default for TerminalOutput {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputFormatter for TerminalOutput {
    fn render(&self, report: &Report<'_>, writer: &mut dyn Write) -> Result<()> {
        if self.use_color() {
            self.write_report(report, &mut Ansi::new(writer))
        } else {
            self.write_report(report, &mut NoColor::new(writer))
        }
    }
}

fn colored<W: WriteColor>(w: &mut W, color: Color, text: &str) -> Result<()> {
    w.set_color(ColorSpec::new().set_fg(Some(color)))?;
    write!(w, "{}", text)?;
    w.reset()?;
    Ok(())
}

fn heading<W: WriteColor>(w: &mut W, text: &str) -> Result<()> {
    w.set_color(ColorSpec::new().set_bold(true))?;
    writeln!(w, "{}", text)?;
    w.reset()?;
    Ok(())
}

fn write_header<W: WriteColor>(w: &mut W, report: &Report<'_>) -> Result<()> {
    writeln!(w, "{}", RULE)?;
    writeln!(
        w,
        " storediff: {} ({} → {})",
        report.table, report.left.name, report.right.name
    )?;
    writeln!(w, "{}", RULE)?;
    writeln!(w)?;
    Ok(())
}

fn describe(column: &Column) -> String {
    let mut text = format!("{} {}", column.name, column.column_type);
    if column.not_null {
        text.push_str(" not null");
    }
    if column.auto_increment {
        text.push_str(" auto increment");
    }
    text
}

fn write_column_diff<W: WriteColor>(w: &mut W, diff: &ColumnDiff, report: &Report<'_>) -> Result<()> {
    if diff.is_empty() {
        return Ok(());
    }

    heading(w, "Column Differences:")?;
    for column in &diff.left {
        match diff.right.iter().find(|r| r.name == column.name) {
            Some(counterpart) => {
                colored(w, Color::Yellow, "  ~ ")?;
                writeln!(w, "{} → {}", describe(column), describe(counterpart))?;
            }
            None => {
                colored(w, Color::Red, "  - ")?;
                writeln!(w, "{} (only in {})", describe(column), report.left.name)?;
            }
        }
    }
    for column in diff.right.iter().filter(|r| !diff.left.iter().any(|l| l.name == r.name)) {
        colored(w, Color::Green, "  + ")?;
        writeln!(w, "{} (only in {})", describe(column), report.right.name)?;
    }
    writeln!(w)?;
    Ok(())
}

fn write_summary<W: WriteColor>(w: &mut W, report: &Report<'_>) -> Result<()> {
    let stats = &report.stats;
    write!(w, "Summary: ")?;
    colored(w, Color::Red, &format!("-{}", stats.rows_left_only))?;
    write!(w, " only in {}, ", report.left.name)?;
    colored(w, Color::Green, &format!("+{}", stats.rows_right_only))?;
    write!(w, " only in {}, ", report.right.name)?;
    colored(w, Color::Yellow, &format!("~{}", stats.rows_modified))?;
    writeln!(
        w,
        " modified (out of {} → {} rows)",
        report.left.table.row_count(),
        report.right.table.row_count()
    )?;
    if stats.columns_left + stats.columns_right > 0 {
        writeln!(
            w,
            "Columns: {} only in {}, {} only in {}, {} modified",
            stats.columns_left - stats.columns_modified,
            report.left.name,
            stats.columns_right - stats.columns_modified,
            report.right.name,
            stats.columns_modified
        )?;
    }
    writeln!(w)?;
    Ok(())
}

fn write_rows<W: WriteColor>(
    w: &mut W,
    side: Side<'_>,
    rows: &[(String, Row)],
    color: Color,
) -> Result<()> {
    if rows.is_empty() {
        return Ok(());
    }

    w.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true))?;
    writeln!(w, "Only in {}:", side.name)?;
    w.reset()?;
    let data = table_data(side.table, rows.iter().map(|(_, row)| row));
    write!(w, "{}", build_table(&data))?;
    writeln!(w)?;
    Ok(())
}

fn table_data<'r>(table: &Table, rows: impl Iterator<Item = &'r Row>) -> Vec<Vec<String>> {
    let headers: Vec<String> = table.schema.column_names().map(str::to_string).collect();
    let mut data = vec![headers];
    for row in rows {
        data.push(
            table
                .schema
                .column_names()
                .map(|name| {
                    row.get(name)
                        .map(|v| v.value.display().into_owned())
                        .unwrap_or_default()
                })
                .collect(),
        );
    }
    data
}

fn write_modified_rows<W: WriteColor>(w: &mut W, report: &Report<'_>) -> Result<()> {
    if report.rows.modified.is_empty() {
        return Ok(());
    }

    w.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true))?;
    writeln!(w, "Modified Rows:")?;
    w.reset()?;
    for modified in &report.rows.modified {
        writeln!(w, "  {}:", modified.key)?;
        for change in &modified.changes {
            write_cell_change(w, change)?;
        }
    }
    writeln!(w)?;
    Ok(())
}

fn write_cell_change<W: WriteColor>(w: &mut W, change: &CellChange) -> Result<()> {
    write!(w, "    {}: ", change.column)?;
    colored(w, Color::Red, &change.left_value.display())?;
    write!(w, " → ")?;
    colored(w, Color::Green, &change.right_value.display())?;
    writeln!(w)?;
    Ok(())
}

/// Draw a boxed table; the first row is the header
fn build_table(data: &[Vec<String>]) -> String {
    let Some(header) = data.first().filter(|h| !h.is_empty()) else {
        return String::new();
    };

    let mut widths = vec![0; header.len()];
    for row in data {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let border = |left: char, mid: char, right: char| {
        let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
        format!("{}{}{}\n", left, segments.join(&mid.to_string()), right)
    };
    let line = |row: &[String]| {
        let mut out = String::from("│");
        for (cell, width) in row.iter().zip(&widths) {
            out.push_str(&format!(" {:width$} │", cell, width = width));
        }
        out.push('\n');
        out
    };

    let mut output = border('┌', '┬', '┐');
    output.push_str(&line(header));
    output.push_str(&border('├', '┼', '┤'));
    for row in &data[1..] {
        output.push_str(&line(row));
    }
    output.push_str(&border('└', '┴', '┘'));
    output
}
