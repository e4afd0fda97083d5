//! SQLTrail CLI - table-level lineage from SQL query history

use sqltrail_cli::cli;
use sqltrail_cli::input;
use sqltrail_cli::output;

use anyhow::{bail, Context, Result};
use clap::Parser;
use sqltrail_core::{build_graph, extract_execution, LineageMap, LiveCatalog};
use std::fs;
use std::io::{self, Write};
use std::process::ExitCode;

use cli::{Args, OutputFormat};
use output::{format_csv, format_html, format_json, format_table};

/// Some history rows could not be tokenized.
const EXIT_FAILURE: u8 = 1;
/// Configuration error (e.g. graph output without a catalog).
const EXIT_CONFIG_ERROR: u8 = 66;

fn main() -> ExitCode {
    let args = Args::parse();

    match run(args) {
        Ok(has_errors) => {
            if has_errors {
                ExitCode::from(EXIT_FAILURE)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("sqltrail: error: {e:#}");
            ExitCode::from(EXIT_CONFIG_ERROR)
        }
    }
}

fn run(args: Args) -> Result<bool> {
    let dialect = args.dialect.into();
    let mut history = input::read_history(args.history.as_ref())?;
    if let Some(database) = &args.database {
        history.retain(|row| row.database.eq_ignore_ascii_case(database));
    }

    let mut map = LineageMap::new();
    let mut failed = 0usize;
    for execution in &history {
        match extract_execution(execution, dialect) {
            Ok(record) => {
                if record.target.is_none() && record.sources.is_empty() && !args.quiet {
                    eprintln!(
                        "sqltrail: warning: no lineage found in statement executed at {}: {}",
                        execution.executed_at.to_rfc3339(),
                        snippet(&execution.query_text)
                    );
                }
                map.record(record);
            }
            Err(e) => {
                failed += 1;
                if !args.quiet {
                    eprintln!(
                        "sqltrail: warning: skipping statement executed at {}: {e}",
                        execution.executed_at.to_rfc3339()
                    );
                }
            }
        }
    }

    let rendered = match args.format {
        OutputFormat::Table => format_table(&map, args.output.is_none()),
        OutputFormat::Json => format_json(&map, args.compact)?,
        OutputFormat::Csv => format_csv(&map)?,
        OutputFormat::Dot => build_dot(&args, &map)?,
        OutputFormat::Html => format_html(&build_dot(&args, &map)?),
    };

    match &args.output {
        Some(path) => fs::write(path, rendered)
            .with_context(|| format!("Failed to write output to {}", path.display()))?,
        None => {
            io::stdout()
                .write_all(rendered.as_bytes())
                .context("Failed to write to stdout")?;
        }
    }

    if failed > 0 && !args.quiet {
        eprintln!(
            "sqltrail: {failed} of {} history rows could not be tokenized",
            history.len()
        );
    }

    Ok(failed > 0)
}

/// First line of a statement, truncated, for warning messages.
fn snippet(sql: &str) -> String {
    let line = sql.lines().next().unwrap_or("").trim();
    if line.chars().count() > 80 {
        let head: String = line.chars().take(80).collect();
        format!("{head}...")
    } else {
        line.to_string()
    }
}

/// Graph output needs the live-catalog snapshot to filter dropped objects.
fn build_dot(args: &Args, map: &LineageMap) -> Result<String> {
    let Some(path) = &args.catalog else {
        bail!("--catalog is required for {:?} output", args.format);
    };
    let mut objects = input::read_catalog(path)?;
    if let Some(database) = &args.database {
        objects.retain(|obj| obj.database.eq_ignore_ascii_case(database));
    }
    let catalog = LiveCatalog::from_objects(objects);
    Ok(build_graph(map, &catalog).to_dot())
}
