use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use log::{info, warn};
use serde::Deserialize;
use serde_json::Value;

use super::LineageNode;

pub fn load_snapshot(path: &Path) -> Result<Vec<LineageNode>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read lineage snapshot {}", path.display()))?;
    let nodes = parse_snapshot(&raw)
        .with_context(|| format!("failed to parse lineage snapshot {}", path.display()))?;
    info!(path:? = path, nodes = nodes.len(); "Loaded lineage snapshot");
    Ok(nodes)
}

/// Parses either a bare array of records or an object carrying a `nodes` array.
///
/// Duplicate lineage codes keep their first occurrence.
pub fn parse_snapshot(raw: &str) -> Result<Vec<LineageNode>> {
    let parsed: Value = serde_json::from_str(raw).context("invalid JSON in lineage snapshot")?;

    let records = match &parsed {
        Value::Array(records) => records,
        Value::Object(object) => object
            .get("nodes")
            .and_then(Value::as_array)
            .ok_or_else(|| anyhow!("snapshot object has no `nodes` array"))?,
        _ => return Err(anyhow!("unexpected JSON type for lineage snapshot")),
    };

    let mut seen = HashSet::with_capacity(records.len());
    let mut nodes = Vec::with_capacity(records.len());
    for (position, record) in records.iter().enumerate() {
        let node = LineageNode::deserialize(record)
            .with_context(|| format!("invalid lineage record at position {position}"))?;
        if node.lineage_code.is_empty() {
            warn!(position; "Skipping lineage record without a code");
            continue;
        }
        if !seen.insert(node.lineage_code.clone()) {
            warn!(code = node.lineage_code.as_str(); "Skipping duplicate lineage record");
            continue;
        }
        nodes.push(node);
    }

    Ok(nodes)
}
