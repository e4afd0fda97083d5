//! Human-readable table output formatting.

use is_terminal::IsTerminal;
use owo_colors::OwoColorize;
use sqltrail_core::LineageMap;
use std::fmt::Write;

/// Format the consolidated lineage as human-readable text with optional
/// colors.
pub fn format_table(map: &LineageMap, use_colors: bool) -> String {
    let colored = use_colors && std::io::stdout().is_terminal();
    let mut out = String::new();

    write_header(&mut out, colored);
    write_summary(&mut out, map, colored);
    write_lineage(&mut out, map, colored);

    out
}

fn write_header(out: &mut String, colored: bool) {
    let title = "SQLTrail Lineage";
    let line = "═".repeat(50);

    if colored {
        writeln!(out, "{}", title.bold()).unwrap();
        writeln!(out, "{}", line.dimmed()).unwrap();
    } else {
        writeln!(out, "{title}").unwrap();
        writeln!(out, "{line}").unwrap();
    }
}

fn write_summary(out: &mut String, map: &LineageMap, colored: bool) {
    let edge_count: usize = map.iter().map(|(_, entry)| entry.sources.len()).sum();
    let stats = format!("Summary: {} targets | {} dependencies", map.len(), edge_count);

    if colored {
        writeln!(out, "{}", stats.cyan()).unwrap();
    } else {
        writeln!(out, "{stats}").unwrap();
    }

    writeln!(out).unwrap();
}

fn write_lineage(out: &mut String, map: &LineageMap, colored: bool) {
    for (target, entry) in map.iter() {
        if colored {
            writeln!(out, "{}", target.green().bold()).unwrap();
        } else {
            writeln!(out, "{target}").unwrap();
        }
        if entry.sources.is_empty() {
            writeln!(out, "  (no known sources)").unwrap();
        }
        for source in &entry.sources {
            writeln!(out, "  ← {source}").unwrap();
        }
        if let Some(at) = entry.refreshed_at {
            let line = format!("  last refreshed {}", at.to_rfc3339());
            if colored {
                writeln!(out, "{}", line.dimmed()).unwrap();
            } else {
                writeln!(out, "{line}").unwrap();
            }
        }
        writeln!(out).unwrap();
    }
}
