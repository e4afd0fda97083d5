//! CLI argument parsing using clap.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// SQLTrail - table-level lineage from SQL query history
#[derive(Parser, Debug)]
#[command(name = "sqltrail")]
#[command(about = "Extract table-level lineage from a SQL query history", long_about = None)]
#[command(version)]
pub struct Args {
    /// Query-history JSON file (reads from stdin if not provided)
    #[arg(value_name = "HISTORY")]
    pub history: Option<PathBuf>,

    /// Live-catalog JSON file listing existing tables and stages,
    /// required for graph output so dropped objects are filtered out
    #[arg(long, value_name = "FILE")]
    pub catalog: Option<PathBuf>,

    /// Restrict catalog objects and history rows to one database
    #[arg(long, value_name = "NAME")]
    pub database: Option<String>,

    /// SQL dialect
    #[arg(short, long, default_value = "snowflake", value_enum)]
    pub dialect: DialectArg,

    /// Output format
    #[arg(short, long, default_value = "table", value_enum)]
    pub format: OutputFormat,

    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Suppress warnings on stderr
    #[arg(short, long)]
    pub quiet: bool,

    /// Compact JSON output (no pretty-printing)
    #[arg(short, long)]
    pub compact: bool,
}

/// SQL dialect options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DialectArg {
    Generic,
    Snowflake,
}

impl From<DialectArg> for sqltrail_core::Dialect {
    fn from(d: DialectArg) -> Self {
        match d {
            DialectArg::Generic => sqltrail_core::Dialect::Generic,
            DialectArg::Snowflake => sqltrail_core::Dialect::Snowflake,
        }
    }
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format
    Table,
    /// JSON map of target to sources
    Json,
    /// Graphviz DOT graph
    Dot,
    /// Self-contained HTML graph viewer
    Html,
    /// CSV of (target, source) pairs
    Csv,
}
