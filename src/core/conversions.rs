//! Small value conversions shared by the page and query parsers.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

/// Convert a unix timestamp in seconds to an ISO-8601 UTC string.
#[must_use]
pub fn unix_to_iso(secs: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp(secs, 0).map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// Render a timestamp field as ISO-8601 UTC.
///
/// Numbers and numeric strings are read as unix seconds; any other string is
/// kept verbatim.
#[must_use]
pub fn timestamp_to_iso(v: &Value) -> Option<String> {
    match v {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(unix_to_iso),
        Value::String(s) => {
            let t = s.trim();
            if t.is_empty() {
                None
            } else if let Ok(secs) = t.parse::<i64>() {
                unix_to_iso(secs)
            } else {
                Some(t.to_string())
            }
        }
        _ => None,
    }
}

/// Expand a reduced count (`"12"`, `"1.2K"`, `"3M"`, `12`) to an integer.
#[must_use]
pub fn reduced_count(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => parse_reduced(s),
        _ => None,
    }
}

fn parse_reduced(s: &str) -> Option<u64> {
    let t: String = s.trim().chars().filter(|c| *c != ',' && !c.is_whitespace()).collect();
    if t.is_empty() {
        return None;
    }
    let (num, mult) = match t.chars().last()? {
        'K' | 'k' => (&t[..t.len() - 1], 1_000.0),
        'M' | 'm' => (&t[..t.len() - 1], 1_000_000.0),
        'B' | 'b' => (&t[..t.len() - 1], 1_000_000_000.0),
        _ => (t.as_str(), 1.0),
    };
    let n: f64 = num.parse().ok()?;
    if !n.is_finite() || n < 0.0 {
        return None;
    }
    Some((n * mult).round() as u64)
}
