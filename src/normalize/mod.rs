//! Recover the `data` payload from query responses and rendered pages.
//!
//! Responses are usually a single JSON document, but streamed responses append
//! further documents (deferred fragments) after the first one, and rendered
//! pages embed the payload somewhere inside a script. The strategies are tried
//! in order and the first one yielding structured data wins:
//!
//! 1. parse the whole text and take its `data` key;
//! 2. locate a `"data":{...}` span closed by a sibling `"extensions"` key;
//! 3. strip the known deferred-ad fragment and trailing separators, then retry 1 and 2.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::core::path;

static DATA_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""data"\s*:\s*\{"#).expect("static regex"));

static DEFERRED_AD_FRAGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?s)\{"label":"VideoPlayerRelay_video\$defer\$InstreamVideoAdBreaksPlayer_video".*\}"#,
    )
    .expect("static regex")
});

const EXTENSIONS_SIBLING: &str = r#","extensions""#;

/// Extracts the structured `data` payload from `raw`, or `None` when no strategy works.
pub fn extract_payload(raw: &str) -> Option<Value> {
    if raw.trim().is_empty() {
        return None;
    }
    if let Some(v) = payload_by_parse(raw).or_else(|| payload_by_pattern(raw)) {
        return Some(v);
    }

    let cleaned = clean_response(raw);
    if cleaned != raw {
        tracing::debug!(
            before = raw.len(),
            after = cleaned.len(),
            "retrying payload extraction on cleaned response"
        );
        return payload_by_parse(&cleaned).or_else(|| payload_by_pattern(&cleaned));
    }
    None
}

/// Removes the deferred media-ad fragment and trims trailing separators and whitespace.
pub fn clean_response(raw: &str) -> String {
    let stripped = DEFERRED_AD_FRAGMENT.replace_all(raw, "");
    stripped
        .trim_end_matches(|c: char| c == ',' || c.is_whitespace())
        .to_string()
}

fn payload_by_parse(text: &str) -> Option<Value> {
    let doc: Value = serde_json::from_str(text.trim()).ok()?;
    path::get(&doc, ["data"])
        .filter(|v| !v.is_null())
        .cloned()
}

/// Scans every `"data":{` occurrence and parses the shortest span up to a
/// following `,"extensions"` that is valid JSON. A candidate carrying a
/// `node` key is preferred over the first one found.
fn payload_by_pattern(text: &str) -> Option<Value> {
    let mut first: Option<Value> = None;

    for m in DATA_START.find_iter(text) {
        let open = m.end() - 1;
        let rest = &text[open..];
        let candidate = rest
            .match_indices(EXTENSIONS_SIBLING)
            .find_map(|(end, _)| serde_json::from_str::<Value>(&rest[..end]).ok());

        let Some(value) = candidate else { continue };
        if !value.is_object() {
            continue;
        }
        if path::get(&value, ["node"]).is_some() {
            return Some(value);
        }
        if first.is_none() {
            first = Some(value);
        }
    }
    first
}
