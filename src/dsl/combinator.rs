//! Multi-query aggregation and `each.` broadcast.

use serde_json::Value;
use std::borrow::Cow;

use super::ast::{Aggregate, Segment};
use super::eval::Navigator;
use super::parser::{parse_items, parse_segments};
use crate::error::{QueryError, Result};
use crate::utils;

/// Evaluate `max([...])`, `min([...])` or `range([...])`. Items are decimal
/// literals or single path queries that must resolve to a plain number.
pub fn aggregate(nav: &Navigator<'_>, aggregate: Aggregate, body: &str) -> Result<Value> {
    let items = parse_items(body, nav.query())?;
    let mut values = Vec::with_capacity(items.len());

    for item in items {
        let value = match utils::parse_number(item) {
            Some(literal) => utils::round2(literal),
            None => nav
                .evaluate(item)?
                .as_f64()
                .ok_or_else(|| QueryError::multi_query(item, nav.query()))?,
        };
        values.push(value);
    }

    let result = match aggregate {
        Aggregate::Max => utils::max(&values),
        Aggregate::Min => utils::min(&values),
        Aggregate::Range => utils::max(&values)
            .zip(utils::min(&values))
            .map(|(hi, lo)| hi - lo),
    };
    Ok(utils::number(result.unwrap_or(0.0)))
}

/// Evaluate `each.<path>.<rest>`. Leading keys are followed until they reach
/// a sequence; `rest` then runs once per element against `[element]`.
pub fn broadcast(nav: &Navigator<'_>, body: &str) -> Result<Value> {
    let segments = parse_segments(body, nav.query())?;

    let mut current = nav.root();
    let mut consumed = 0;
    while let Some(Segment::Key(key)) = segments.get(consumed) {
        if current.is_array() {
            break;
        }
        current = current.get(*key).ok_or_else(|| {
            QueryError::path(format!("no object exists at {key}"), nav.query())
        })?;
        consumed += 1;
    }

    let Value::Array(items) = current else {
        return Err(QueryError::path(
            format!("each. requires a sequence at {}", segments_text(body, consumed)),
            nav.query(),
        ));
    };

    let rest = &segments[consumed..];
    tracing::debug!(
        "Broadcasting {} segment(s) over {} element(s)",
        rest.len(),
        items.len()
    );

    items
        .iter()
        .map(|item| {
            if rest.is_empty() {
                Ok(item.clone())
            } else {
                nav.walk(Cow::Owned(Value::Array(vec![item.clone()])), rest)
            }
        })
        .collect::<Result<Vec<_>>>()
        .map(Value::Array)
}

/// The leading path that was expected to reach a sequence.
fn segments_text(body: &str, consumed: usize) -> &str {
    let end = body
        .match_indices('.')
        .nth(consumed.saturating_sub(1))
        .map_or(body.len(), |(i, _)| i);
    if consumed == 0 { body } else { &body[..end] }
}
