//! Shared types for query-history lineage inference.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// SQL dialect used when tokenizing statement text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Generic,
    Snowflake,
}

impl Dialect {
    /// Returns the corresponding `sqlparser` dialect implementation.
    pub fn to_sqlparser_dialect(&self) -> Box<dyn sqlparser::dialect::Dialect> {
        match self {
            Dialect::Generic => Box::new(sqlparser::dialect::GenericDialect {}),
            Dialect::Snowflake => Box::new(sqlparser::dialect::SnowflakeDialect {}),
        }
    }
}

/// One successful write-capable statement execution from the query history.
///
/// `database` and `schema` are the session context the statement ran under;
/// they complete one- and two-part object names during qualification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryExecution {
    pub database: String,
    pub schema: String,
    pub executed_at: DateTime<Utc>,
    pub query_text: String,
}

/// Lineage inferred from a single statement: the table (or stage) it wrote
/// and the tables/stages it read.
///
/// A statement with no discoverable writable position yields `target: None`,
/// which the aggregator treats as "no information" rather than an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementLineage {
    /// Fully qualified name of the written object, if one was found.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Fully qualified names of the objects read, in discovery order,
    /// de-duplicated, never containing the target.
    pub sources: Vec<String>,
    /// When the statement executed; drives recency in the aggregator.
    pub executed_at: DateTime<Utc>,
}

/// Kind of a live catalog object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Table,
    Stage,
}

/// A non-deleted table or stage known to the warehouse catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogObject {
    pub database: String,
    pub schema: String,
    pub name: String,
    pub kind: ObjectKind,
}
