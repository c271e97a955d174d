use std::{fs, path::Path};

use serde_json::Value;
use thiserror::Error;

/// Catalog problems are configuration errors: fatal for initialization,
/// never silently degraded into an empty store.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog not found at {0}")]
    Missing(String),

    #[error("failed to read catalog: {0}")]
    Unreadable(#[from] std::io::Error),

    #[error("catalog is not valid JSON: {0}")]
    Invalid(#[from] serde_json::Error)
}

/// Loads the catalog document and flattens every item identifier in it.
pub fn load_catalog(path: &Path) -> Result<Vec<String>, CatalogError> {
    if !path.exists() {
        return Err(CatalogError::Missing(path.display().to_string()));
    }

    let content = fs::read_to_string(path)?;
    let document: Value = serde_json::from_str(&content)?;

    Ok(collect_item_ids(&document))
}

/// Recursively discovers item identifiers: every string inside any list,
/// at any nesting depth, regardless of the surrounding key names or shape.
pub fn collect_item_ids(document: &Value) -> Vec<String> {
    let mut ids = Vec::new();
    walk(document, &mut ids);
    ids
}

fn walk(node: &Value, ids: &mut Vec<String>) {
    match node {
        Value::Array(entries) => {
            for entry in entries {
                match entry {
                    Value::String(id) => ids.push(item_name(id)),
                    other => walk(other, ids)
                }
            }
        }
        Value::Object(fields) => {
            for value in fields.values() {
                walk(value, ids);
            }
        }
        _ => {}
    }
}

/// Catalog entries may be full paths; the final segment is the item key.
fn item_name(path: &str) -> String {
    path.rsplit('/').next().unwrap_or(path).to_string()
}
