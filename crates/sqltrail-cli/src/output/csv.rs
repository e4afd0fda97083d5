//! CSV output: flattened (target, source) pairs for bulk loading into a
//! lineage fact table.

use anyhow::{Context, Result};
use csv::WriterBuilder;
use sqltrail_core::LineageMap;

pub fn format_csv(map: &LineageMap) -> Result<String> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    writer
        .write_record(["target", "source"])
        .context("Failed to write CSV header")?;
    for pair in map.flatten() {
        writer
            .write_record([&pair.target, &pair.source])
            .context("Failed to write CSV record")?;
    }
    let bytes = writer.into_inner().context("Failed to flush CSV output")?;
    String::from_utf8(bytes).context("CSV output was not valid UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use sqltrail_core::StatementLineage;

    #[test]
    fn test_pairs_one_row_each() {
        let map = LineageMap::from_records([StatementLineage {
            target: Some("\"DB\".\"S\".\"T\"".to_string()),
            sources: vec![
                "\"DB\".\"S\".\"A\"".to_string(),
                "\"DB\".\"S\".\"B\"".to_string(),
            ],
            executed_at: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
        }]);
        let out = format_csv(&map).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "target,source");
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("\"\"A\"\"") || lines[1].contains("\"A\""));
    }

    #[test]
    fn test_empty_map() {
        let out = format_csv(&LineageMap::new()).unwrap();
        assert_eq!(out.trim(), "target,source");
    }
}
