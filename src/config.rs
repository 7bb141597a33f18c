//! Configuration handling for storediff

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::diff::Differ;
use crate::model::ColumnType;

/// Output format for diff results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Terminal,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "terminal" => Ok(OutputFormat::Terminal),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

/// Kind of store a source reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Csv,
    Json,
    Spreadsheet,
}

impl SourceKind {
    /// Guess the kind from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "csv" | "tsv" | "txt" => Some(SourceKind::Csv),
            "json" => Some(SourceKind::Json),
            "xlsx" | "xls" | "xlsm" | "xlsb" | "ods" => Some(SourceKind::Spreadsheet),
            _ => None,
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Csv => write!(f, "csv"),
            SourceKind::Json => write!(f, "json"),
            SourceKind::Spreadsheet => write!(f, "spreadsheet"),
        }
    }
}

/// Declarative description of one side of a diff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Label used in logs and reports
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SourceKind,
    /// File to read
    pub path: PathBuf,
    /// For spreadsheets: which sheet holds the table
    #[serde(default)]
    pub sheet: Option<String>,
    /// Primary key column names, in key order
    #[serde(default)]
    pub primary_key: Vec<String>,
    /// Declared column types, overriding whatever the source reports or infers
    #[serde(default)]
    pub column_types: IndexMap<String, ColumnType>,
}

impl SourceConfig {
    /// Create a source config, inferring the kind from the file extension
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let Some(kind) = SourceKind::from_path(&path) else {
            bail!(
                "Unsupported file format: {}",
                path.extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("unknown")
            );
        };
        Ok(Self {
            name: path.display().to_string(),
            kind,
            path,
            sheet: None,
            primary_key: Vec::new(),
            column_types: IndexMap::new(),
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_primary_key(mut self, columns: Vec<String>) -> Self {
        self.primary_key = columns;
        self
    }

    pub fn with_column_type(mut self, column: impl Into<String>, column_type: ColumnType) -> Self {
        self.column_types.insert(column.into(), column_type);
        self
    }

    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = Some(sheet.into());
        self
    }

    /// Resolve a relative path against `base`
    fn rebase(&mut self, base: &Path) {
        if self.path.is_relative() {
            self.path = base.join(&self.path);
        }
    }
}

/// Configuration for diff operations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Table to fetch from both sources; defaults to the left file's stem
    pub table: Option<String>,
    /// Columns excluded from every comparison
    pub ignore_columns: Vec<String>,
    /// Output format
    pub output_format: OutputFormat,
    /// Only show statistics, not detailed changes
    pub stats_only: bool,
    pub left: Option<SourceConfig>,
    pub right: Option<SourceConfig>,
}

impl Config {
    /// Create a config comparing two sources
    pub fn new(left: SourceConfig, right: SourceConfig) -> Self {
        Self {
            left: Some(left),
            right: Some(right),
            ..Default::default()
        }
    }

    /// Load a YAML config file. Relative source paths are resolved against
    /// the file's directory.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config: Config = serde_yaml::from_str(&text)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        for source in [&mut config.left, &mut config.right].into_iter().flatten() {
            source.rebase(base);
        }
        Ok(config)
    }

    /// Set the table name
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Set columns to ignore
    pub fn with_ignore_columns(mut self, columns: Vec<String>) -> Self {
        self.ignore_columns = columns;
        self
    }

    /// Set output format
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Enable stats-only mode
    pub fn with_stats_only(mut self, stats_only: bool) -> Self {
        self.stats_only = stats_only;
        self
    }

    /// Both sources, or an error naming the missing side
    pub fn sources(&self) -> Result<(&SourceConfig, &SourceConfig)> {
        let left = self.left.as_ref().context("No left source configured")?;
        let right = self.right.as_ref().context("No right source configured")?;
        Ok((left, right))
    }

    /// Table name to request from both sources
    pub fn table_name(&self) -> Result<String> {
        if let Some(ref table) = self.table {
            return Ok(table.clone());
        }
        let (left, _) = self.sources()?;
        left.path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_string)
            .with_context(|| format!("Cannot derive a table name from {}", left.path.display()))
    }

    /// Build the diff engine this config describes
    pub fn differ(&self) -> Differ {
        Differ::new().ignore_columns(self.ignore_columns.iter().cloned())
    }
}
