//! End-to-end flow: history rows through extraction, consolidation and
//! graph rendering.

use chrono::{DateTime, TimeZone, Utc};
use rstest::rstest;
use sqltrail_core::{
    build_graph, extract_execution, CatalogObject, Dialect, LineageMap, LiveCatalog, ObjectKind,
    QueryExecution,
};

fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap()
}

fn execution(schema: &str, hour: u32, sql: &str) -> QueryExecution {
    QueryExecution {
        database: "EDW_DEV".to_string(),
        schema: schema.to_string(),
        executed_at: at(hour),
        query_text: sql.to_string(),
    }
}

fn table(schema: &str, name: &str) -> CatalogObject {
    CatalogObject {
        database: "EDW_DEV".to_string(),
        schema: schema.to_string(),
        name: name.to_string(),
        kind: ObjectKind::Table,
    }
}

#[rstest]
#[case::insert("INSERT INTO FACT_SALES SELECT * FROM RAW.ORDERS", "\"EDW_DEV\".\"CORE\".\"FACT_SALES\"")]
#[case::ctas("CREATE TABLE AGG_DAILY AS SELECT * FROM RAW.ORDERS", "\"EDW_DEV\".\"CORE\".\"AGG_DAILY\"")]
#[case::merge(
    "MERGE INTO DIM_CUSTOMER USING RAW.ORDERS ON 1 = 1 WHEN MATCHED THEN UPDATE SET a = 1",
    "\"EDW_DEV\".\"CORE\".\"DIM_CUSTOMER\""
)]
fn write_statements_produce_a_target(#[case] sql: &str, #[case] expected: &str) {
    let record = extract_execution(&execution("CORE", 10, sql), Dialect::Snowflake).unwrap();
    assert_eq!(record.target.as_deref(), Some(expected));
    assert_eq!(record.sources, vec!["\"EDW_DEV\".\"RAW\".\"ORDERS\""]);
}

#[test]
fn history_consolidates_to_latest_sources() {
    let history = [
        execution("CORE", 8, "INSERT INTO FACT_SALES SELECT * FROM RAW.LEGACY_ORDERS"),
        execution("CORE", 12, "INSERT INTO FACT_SALES SELECT * FROM RAW.ORDERS"),
        execution("CORE", 14, "DELETE FROM STAGING.SCRATCH"),
    ];
    let mut map = LineageMap::new();
    for row in &history {
        let record = extract_execution(row, Dialect::Snowflake).unwrap();
        map.record(record);
    }

    let entry = map.get("\"EDW_DEV\".\"CORE\".\"FACT_SALES\"").unwrap();
    assert_eq!(entry.sources, vec!["\"EDW_DEV\".\"RAW\".\"ORDERS\""]);
    assert_eq!(entry.refreshed_at, Some(at(12)));
}

#[test]
fn graph_skips_dropped_tables_but_keeps_live_lineage() {
    let history = [execution(
        "CORE",
        10,
        "INSERT INTO FACT_SALES SELECT * FROM RAW.ORDERS o JOIN RAW.DROPPED d ON o.id = d.id",
    )];
    let mut map = LineageMap::new();
    for row in &history {
        map.record(extract_execution(row, Dialect::Snowflake).unwrap());
    }
    let catalog = LiveCatalog::from_objects([
        table("CORE", "FACT_SALES"),
        table("RAW", "ORDERS"),
    ]);

    let dot = build_graph(&map, &catalog).to_dot();
    assert!(dot.contains(
        "\"ORDERS\\nSchema: RAW\" -> \"FACT_SALES\\nSchema: CORE\" [ style=\"solid\" ];"
    ));
    assert!(!dot.contains("DROPPED"));
    // FACT_ prefix in the CORE schema lands in the fact-table color block.
    let fact_block = dot.split("color=\"#C5CAE9\"").nth(1).unwrap();
    let block_head = fact_block.split("node [").next().unwrap();
    assert!(block_head.contains("\"FACT_SALES\\nSchema: CORE\";"));
}
