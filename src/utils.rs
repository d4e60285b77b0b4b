use regex::Regex;
use serde_json::{Number, Value};
use std::collections::HashSet;
use std::sync::LazyLock;

/// Largest integer a JSON number can carry without losing precision.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Convert a computed number to a JSON value, preferring an integer when the
/// value is integral.
pub fn number(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER {
        Value::from(value as i64)
    } else {
        Number::from_f64(value).map_or(Value::Null, Value::Number)
    }
}

/// Round to 2 decimal places by shifting the decimal exponent, so that
/// `1.005` rounds to `1.01` rather than falling foul of binary representation.
pub fn round2(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let shifted: f64 = format!("{value}e2").parse().unwrap_or(value * 100.0);
    let rounded = (shifted + 0.5).floor();
    format!("{rounded}e-2").parse().unwrap_or(rounded / 100.0)
}

/// Parse a whole literal as a finite number.
pub fn parse_number(literal: &str) -> Option<f64> {
    literal
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

static LEADING_NUMBER: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^\s*([+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?)").ok()
});

/// Parse the longest numeric prefix of a literal, ignoring anything after it:
/// `"5abc"` reads as 5, `"abc"` as nothing.
pub fn parse_leading_number(literal: &str) -> Option<f64> {
    let captures = LEADING_NUMBER.as_ref()?.captures(literal)?;
    parse_number(captures.get(1)?.as_str())
}

/// Remove every single and double quote character.
pub fn strip_quotes(literal: &str) -> String {
    literal.chars().filter(|c| *c != '"' && *c != '\'').collect()
}

/// The numeric elements, skipping nulls, or `None` if any other element is
/// not a number.
pub fn numbers(items: &[Value]) -> Option<Vec<f64>> {
    items
        .iter()
        .filter(|item| !item.is_null())
        .map(Value::as_f64)
        .collect()
}

pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sum the numeric `key` field of every element; elements without a numeric
/// field contribute nothing.
pub fn sum_by(items: &[Value], key: &str) -> f64 {
    items
        .iter()
        .filter_map(|item| item.get(key).and_then(Value::as_f64))
        .sum()
}

/// Splice nested sequences into their parent, one level deep.
pub fn flatten_one(items: Vec<Value>) -> Vec<Value> {
    let mut flat = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::Array(inner) => flat.extend(inner),
            other => flat.push(other),
        }
    }
    flat
}

/// Keep the first element for each distinct value of `key`, in order.
/// Elements missing the key share a single "absent" bucket.
pub fn unique_by(items: &[Value], key: &str) -> Vec<Value> {
    let mut seen: HashSet<Option<String>> = HashSet::new();
    items
        .iter()
        .filter(|item| seen.insert(item.get(key).map(Value::to_string)))
        .cloned()
        .collect()
}

/// Structural lookup along `path`; numeric segments index into sequences.
pub fn deep_get<'a, 'p, I>(value: &'a Value, path: I) -> Option<&'a Value>
where
    I: IntoIterator<Item = &'p str>,
{
    path.into_iter().try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Absent, null, or the empty string.
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

/// Blank, or the number zero.
pub fn is_empty_or_zero(value: Option<&Value>) -> bool {
    is_blank(value) || value.and_then(Value::as_f64) == Some(0.0)
}
