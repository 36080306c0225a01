//! Safe navigation over nested JSON.
//!
//! Response shapes on the target site shift without notice, so every parser
//! reads through [`get`]: a missing key, an out-of-range index or a value of
//! the wrong shape yields `None` instead of an error.

use serde_json::Value;

/// One step of a path: an object key or an array index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seg<'p> {
    Key(&'p str),
    Index(usize),
}

impl<'p> From<&'p str> for Seg<'p> {
    fn from(k: &'p str) -> Self {
        Seg::Key(k)
    }
}

impl<'p> From<&'p String> for Seg<'p> {
    fn from(k: &'p String) -> Self {
        Seg::Key(k.as_str())
    }
}

impl From<usize> for Seg<'_> {
    fn from(i: usize) -> Self {
        Seg::Index(i)
    }
}

impl<'p> From<&Seg<'p>> for Seg<'p> {
    fn from(s: &Seg<'p>) -> Self {
        *s
    }
}

/// Walks `path` one segment at a time starting at `value`.
///
/// Returns `None` as soon as a step cannot be taken. An empty path returns `value` itself.
pub fn get<'a, 'p, I, S>(value: &'a Value, path: I) -> Option<&'a Value>
where
    I: IntoIterator<Item = S>,
    S: Into<Seg<'p>>,
{
    let mut current = value;
    for seg in path {
        current = match (seg.into(), current) {
            (Seg::Key(k), Value::Object(map)) => map.get(k)?,
            (Seg::Index(i), Value::Array(arr)) => arr.get(i)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Like [`get`] but falls back to `default` when the path is absent.
pub fn get_or<'a, 'p, I, S>(value: &'a Value, path: I, default: &'a Value) -> &'a Value
where
    I: IntoIterator<Item = S>,
    S: Into<Seg<'p>>,
{
    get(value, path).unwrap_or(default)
}

/// String at `path`. Numbers are rendered in decimal; `null` counts as absent.
pub fn get_string<'p, I, S>(value: &Value, path: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: Into<Seg<'p>>,
{
    match get(value, path)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Unsigned integer at `path`, accepting numeric strings.
pub fn get_u64<'p, I, S>(value: &Value, path: I) -> Option<u64>
where
    I: IntoIterator<Item = S>,
    S: Into<Seg<'p>>,
{
    match get(value, path)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Boolean at `path`.
pub fn get_bool<'p, I, S>(value: &Value, path: I) -> Option<bool>
where
    I: IntoIterator<Item = S>,
    S: Into<Seg<'p>>,
{
    get(value, path)?.as_bool()
}

/// Array at `path`, or an empty slice.
pub fn get_array<'a, 'p, I, S>(value: &'a Value, path: I) -> &'a [Value]
where
    I: IntoIterator<Item = S>,
    S: Into<Seg<'p>>,
{
    get(value, path)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}
