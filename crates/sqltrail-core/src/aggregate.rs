//! Consolidation of per-statement lineage records by recency.
//!
//! Many historical executions write the same target; the consolidated view
//! keeps, per target, the source set of the most recent execution that had
//! any discoverable sources. Later empty-source records never erase an
//! earlier non-empty result, but they do make the target exist in the map,
//! so a table only ever replaced wholesale still shows up.

use crate::types::StatementLineage;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
#[cfg(feature = "tracing")]
use tracing::trace;

/// Consolidated sources for one target.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetLineage {
    /// Sources from the most recent execution with a non-empty source set.
    pub sources: Vec<String>,
    /// Execution time that supplied `sources`; `None` until a non-empty
    /// source set has been seen.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refreshed_at: Option<DateTime<Utc>>,
}

/// One flattened (target, source) lineage fact, the shape expected by a
/// bulk-loadable lineage-fact store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineagePair {
    pub target: String,
    pub source: String,
}

/// The consolidated lineage map: target name to its latest known sources,
/// iterated in target-name order for deterministic rendering.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct LineageMap {
    targets: BTreeMap<String, TargetLineage>,
}

impl LineageMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds an already-extracted record stream into a map.
    ///
    /// Arrival order does not matter: recency is decided by comparing the
    /// carried execution timestamps, not by assuming monotonic input.
    pub fn from_records(records: impl IntoIterator<Item = StatementLineage>) -> Self {
        let mut map = Self::new();
        for record in records {
            map.record(record);
        }
        map
    }

    /// Applies one statement record. Records without a target carry no
    /// information and are dropped.
    pub fn record(&mut self, record: StatementLineage) {
        let Some(target) = record.target else {
            return;
        };
        let entry = self.targets.entry(target).or_default();
        let newer = entry
            .refreshed_at
            .is_none_or(|at| record.executed_at > at);
        if newer && !record.sources.is_empty() {
            #[cfg(feature = "tracing")]
            trace!(executed_at = %record.executed_at, "refreshing target sources");
            entry.sources = record.sources;
            entry.refreshed_at = Some(record.executed_at);
        }
    }

    pub fn get(&self, target: &str) -> Option<&TargetLineage> {
        self.targets.get(target)
    }

    /// Targets and their consolidated sources, sorted by target name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TargetLineage)> {
        self.targets.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Flattens the map into (target, source) pairs for bulk loading.
    pub fn flatten(&self) -> Vec<LineagePair> {
        self.iter()
            .flat_map(|(target, entry)| {
                entry.sources.iter().map(move |source| LineagePair {
                    target: target.to_string(),
                    source: source.clone(),
                })
            })
            .collect()
    }
}
