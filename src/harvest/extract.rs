//! Pull identifiers and fallback parameters out of the rendered page.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use regex::Regex;
use serde_json::Value;

use crate::core::FbError;

static POST_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""post_id":"([0-9]{10,})""#).expect("static regex"));

// base64("feedback:") is "ZmVlZGJhY2s6"; the digits that follow are the post id.
static FEEDBACK_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""feedback_id":"ZmVlZGJhY2s6([0-9]{10,})""#).expect("static regex")
});

/// Finds the numeric post id in the page, trying the explicit field first.
pub fn extract_post_id(html: &str) -> Result<String, FbError> {
    POST_ID
        .captures(html)
        .or_else(|| FEEDBACK_ID.captures(html))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or(FbError::PostIdNotFound)
}

/// Feedback-scope id used by the comments query: base64 of `feedback:<post_id>`.
pub fn encode_feedback_id(post_id: &str) -> String {
    STANDARD.encode(format!("feedback:{post_id}"))
}

/// Yields `(opening tag, body)` for every `<script type="application/json">` block.
pub(crate) fn iter_json_scripts(html: &str) -> Vec<(&str, &str)> {
    let mut res = Vec::new();
    let mut pos = 0usize;

    while let Some(si) = html[pos..].find("<script") {
        let si = pos + si;
        let open_end = match html[si..].find('>') {
            Some(x) => si + x,
            None => break,
        };
        let tag_open = &html[si..=open_end];

        let close = match html[open_end + 1..].find("</script>") {
            Some(x) => open_end + 1 + x,
            None => break,
        };
        if tag_open.contains("type=\"application/json\"") {
            res.push((tag_open, &html[open_end + 1..close]));
        }
        pos = close + "</script>".len();
    }
    res
}

/// Searches embedded JSON scripts for the `missing` parameter names.
///
/// Every keyed container is searched recursively; the first value seen for a
/// name wins. A nested `consistency.rev` satisfies `__rev`. Scanning stops as
/// soon as every name is found.
pub fn scan_script_params(html: &str, missing: &[&str]) -> BTreeMap<String, String> {
    let mut found = BTreeMap::new();
    if missing.is_empty() {
        return found;
    }

    for (_, body) in iter_json_scripts(html) {
        let Ok(doc) = serde_json::from_str::<Value>(body.trim()) else {
            continue;
        };
        collect_params(&doc, missing, &mut found);
        if missing.iter().all(|m| found.contains_key(*m)) {
            break;
        }
    }
    found
}

fn collect_params(v: &Value, wanted: &[&str], found: &mut BTreeMap<String, String>) {
    match v {
        Value::Object(map) => {
            for (key, value) in map {
                if wanted.contains(&key.as_str()) {
                    if let Some(s) = scalar_to_string(value) {
                        found.entry(key.clone()).or_insert(s);
                    }
                } else if key == "consistency"
                    && wanted.contains(&"__rev")
                    && let Some(rev) = value.get("rev").and_then(scalar_to_string)
                {
                    found.entry("__rev".to_string()).or_insert(rev);
                }
                if value.is_object() || value.is_array() {
                    collect_params(value, wanted, found);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_params(item, wanted, found);
            }
        }
        _ => {}
    }
}

fn scalar_to_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
