//! Input handling for history and catalog files, with stdin support.

use anyhow::{Context, Result};
use sqltrail_core::{CatalogObject, QueryExecution};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Read the query history from a JSON file, or from stdin if no path was
/// provided. The file holds a JSON array of execution records.
pub fn read_history(path: Option<&PathBuf>) -> Result<Vec<QueryExecution>> {
    match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read history file: {}", path.display()))?;
            parse_history(&content)
                .with_context(|| format!("Invalid history file: {}", path.display()))
        }
        None => {
            let mut content = String::new();
            io::stdin()
                .read_to_string(&mut content)
                .context("Failed to read history from stdin")?;
            parse_history(&content).context("Invalid history on stdin")
        }
    }
}

fn parse_history(content: &str) -> Result<Vec<QueryExecution>> {
    serde_json::from_str(content).context("expected a JSON array of execution records")
}

/// Read the live-catalog snapshot: a JSON array of table and stage objects.
pub fn read_catalog(path: &Path) -> Result<Vec<CatalogObject>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid catalog file: {}", path.display()))
}
