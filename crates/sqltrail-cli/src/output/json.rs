//! JSON output: the consolidated map as one object, target to source list.

use anyhow::Result;
use serde_json::{Map, Value};
use sqltrail_core::LineageMap;

pub fn format_json(map: &LineageMap, compact: bool) -> Result<String> {
    let mut object = Map::new();
    for (target, entry) in map.iter() {
        let sources = entry
            .sources
            .iter()
            .map(|s| Value::String(s.clone()))
            .collect();
        object.insert(target.to_string(), Value::Array(sources));
    }
    let value = Value::Object(object);
    let rendered = if compact {
        serde_json::to_string(&value)?
    } else {
        serde_json::to_string_pretty(&value)?
    };
    Ok(rendered)
}
