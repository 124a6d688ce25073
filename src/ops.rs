//! Shared operation wrappers for all interfaces (CLI, MCP, LSP, plugin).
//!
//! Each `op_*` function is a pure, synchronous wrapper around the `algo`
//! modules. Input and output are `serde_json::Value`, with no dependency on
//! rmcp, tower-lsp, clap, or nu-plugin.

use rayon::prelude::*;
use serde_json::{json, Value};

use crate::algo::cleaner::Cleaner;
use crate::algo::registry::Registry;
use crate::algo::scan;
use crate::error::CleanError;

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Extract a text field from a JSON object, returning "" if missing.
/// A bare JSON string row is its own text.
pub fn get_text(row: &Value, field: &str) -> String {
    match row {
        Value::String(s) => s.clone(),
        _ => row
            .get(field)
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string(),
    }
}

/// JSON form of a clean failure.
pub fn error_json(original: &str, err: &CleanError) -> Value {
    let mut obj = json!({
        "original": original,
        "error": err.message(),
        "error_kind": err.kind(),
    });
    if let CleanError::UnsupportedPlatform {
        supported_platforms,
        ..
    } = err
    {
        obj["supported_platforms"] = json!(supported_platforms);
    }
    obj
}

fn clean_json(cleaner: &Cleaner, url: &str) -> Result<Value, CleanError> {
    let outcome = cleaner.clean_detailed(url)?;
    Ok(json!({
        "original": url,
        "clean_url": outcome.result.canonical_url,
        "platform": outcome.result.platform,
        "platform_key": outcome.platform_key,
        "removed": outcome.removed,
        "changed": outcome.result.canonical_url != url.trim(),
    }))
}

// ── Operations ───────────────────────────────────────────────────────────────

pub fn op_clean_url(cleaner: &Cleaner, url: &str) -> Result<Value, String> {
    clean_json(cleaner, url).map_err(|e| e.to_string())
}

/// Clean many URLs. Failures become error rows instead of failing the batch.
pub fn op_clean_urls(cleaner: &Cleaner, urls: &[String]) -> Value {
    let rows: Vec<Value> = urls
        .par_iter()
        .map(|u| clean_json(cleaner, u).unwrap_or_else(|e| error_json(u, &e)))
        .collect();
    Value::Array(rows)
}

/// Append `_clean_url` and `_platform` columns to each record, using the
/// URL found in `field`. Rows that fail get nulls plus a `_clean_error`.
pub fn op_clean_records(cleaner: &Cleaner, rows: &[Value], field: &str) -> Value {
    let output: Vec<Value> = rows
        .par_iter()
        .map(|row| {
            let url = get_text(row, field);
            let cleaned = cleaner.clean(&url);
            let mut obj = match row {
                Value::Object(map) => map.clone(),
                other => {
                    let mut map = serde_json::Map::new();
                    map.insert(field.to_string(), other.clone());
                    map
                }
            };
            match cleaned {
                Ok(r) => {
                    obj.insert("_clean_url".into(), Value::String(r.canonical_url));
                    obj.insert("_platform".into(), Value::String(r.platform));
                }
                Err(e) => {
                    obj.insert("_clean_url".into(), Value::Null);
                    obj.insert("_platform".into(), Value::Null);
                    obj.insert("_clean_error".into(), Value::String(e.to_string()));
                }
            }
            Value::Object(obj)
        })
        .collect();

    Value::Array(output)
}

pub fn op_clean_text(cleaner: &Cleaner, text: &str) -> Value {
    let findings = scan::scan(cleaner, text);
    let rewritten = scan::rewrite(text, &findings);
    json!({
        "text": rewritten,
        "changed": findings.iter().filter(|f| f.changed).count(),
        "findings": findings,
    })
}

pub fn op_platforms(registry: &Registry) -> Value {
    json!(registry.platforms())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_text_handles_bare_strings() {
        assert_eq!(get_text(&json!("youtu.be/x"), "url"), "youtu.be/x");
        assert_eq!(get_text(&json!({"url": "a"}), "url"), "a");
        assert_eq!(get_text(&json!({"other": "a"}), "url"), "");
    }

    #[test]
    fn error_json_carries_supported_list() {
        let cleaner = Cleaner::default();
        let err = cleaner.clean("example.com").unwrap_err();
        let v = error_json("example.com", &err);
        assert_eq!(v["error_kind"], "unsupported_platform");
        assert_eq!(v["supported_platforms"].as_array().unwrap().len(), 6);
    }

    #[test]
    fn error_json_invalid_has_no_list() {
        let cleaner = Cleaner::default();
        let err = cleaner.clean("not a url::::").unwrap_err();
        let v = error_json("not a url::::", &err);
        assert_eq!(v["error"], "Invalid URL format");
        assert!(v.get("supported_platforms").is_none());
    }
}
