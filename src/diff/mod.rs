//! Compares emitted definitions against previously stored ones.

use colored::Colorize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use similar::{ChangeTag, TextDiff};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeStatus {
    Added,
    Removed,
    Modified,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DefinitionChange {
    pub name: String,
    pub status: ChangeStatus,
    pub stored_fingerprint: Option<String>,
    pub current_fingerprint: Option<String>,
}

/// Same value with object keys sorted at every level.
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::with_capacity(map.len());
            for key in keys {
                sorted.insert(key.clone(), canonicalize(&map[key.as_str()]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// SHA-256 of the canonical JSON form; key order does not affect it.
pub fn fingerprint(definition: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonicalize(definition).to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn has_changes(stored: &Value, current: &Value) -> bool {
    fingerprint(stored) != fingerprint(current)
}

/// Line diff of the pretty-printed canonical forms, in hunks of three context lines,
/// under a header naming the pipeline.
pub fn format_definition_diff(stored: &Value, current: &Value) -> String {
    let old = serde_json::to_string_pretty(&canonicalize(stored)).unwrap_or_default();
    let new = serde_json::to_string_pretty(&canonicalize(current)).unwrap_or_default();
    let name = pipeline_name(current)
        .or_else(|| pipeline_name(stored))
        .unwrap_or("<unnamed>");

    let mut output = format!("{} {}\n", "pipeline".bold(), name.bold());
    let diff = TextDiff::from_lines(&old, &new);

    for hunk in diff.unified_diff().context_radius(3).iter_hunks() {
        output.push_str(&format!("{}\n", hunk.header()).cyan().to_string());
        for change in hunk.iter_changes() {
            let line = change.value().trim_end();
            let rendered = match change.tag() {
                ChangeTag::Delete => format!("-{}", line).red().to_string(),
                ChangeTag::Insert => format!("+{}", line).green().to_string(),
                ChangeTag::Equal => format!(" {}", line),
            };
            output.push_str(&rendered);
            output.push('\n');
        }
    }

    output
}

fn pipeline_name(definition: &Value) -> Option<&str> {
    definition.get("name").and_then(Value::as_str)
}

/// Matches definitions by pipeline name. Current order first, then removals.
pub fn changed_pipelines(stored: &[Value], current: &[Value]) -> Vec<DefinitionChange> {
    let mut changes = Vec::new();

    for definition in current {
        let Some(name) = pipeline_name(definition) else {
            warn!("Skipping definition without a name");
            continue;
        };
        let current_fp = fingerprint(definition);

        match stored.iter().find(|s| pipeline_name(s) == Some(name)) {
            None => changes.push(DefinitionChange {
                name: name.to_string(),
                status: ChangeStatus::Added,
                stored_fingerprint: None,
                current_fingerprint: Some(current_fp),
            }),
            Some(old) => {
                let stored_fp = fingerprint(old);
                if stored_fp != current_fp {
                    changes.push(DefinitionChange {
                        name: name.to_string(),
                        status: ChangeStatus::Modified,
                        stored_fingerprint: Some(stored_fp),
                        current_fingerprint: Some(current_fp),
                    });
                }
            }
        }
    }

    for definition in stored {
        let Some(name) = pipeline_name(definition) else { continue };
        if !current.iter().any(|c| pipeline_name(c) == Some(name)) {
            changes.push(DefinitionChange {
                name: name.to_string(),
                status: ChangeStatus::Removed,
                stored_fingerprint: Some(fingerprint(definition)),
                current_fingerprint: None,
            });
        }
    }

    if !changes.is_empty() {
        info!(changed = changes.len(), "Pipeline definitions changed");
    }
    changes
}
