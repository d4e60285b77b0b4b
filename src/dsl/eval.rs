//! Path navigation and operator semantics.

use regex::Regex;
use serde_json::Value;
use std::borrow::Cow;
use std::cmp::Ordering;
use time::OffsetDateTime;

use super::ast::{Comparator, DateFormat, Equator, Operator, OperatorCall, Segment};
use super::dates;
use super::parser::{parse_equator, parse_segments};
use crate::error::{QueryError, Result};
use crate::utils;

/// Walks segments left to right against a document.
///
/// `root` is the untouched document (used for `age()` reference paths) and
/// `query` the full query text quoted in errors.
pub struct Navigator<'a> {
    root: &'a Value,
    query: &'a str,
    now: OffsetDateTime,
}

impl<'a> Navigator<'a> {
    pub fn new(root: &'a Value, query: &'a str, now: OffsetDateTime) -> Self {
        Navigator { root, query, now }
    }

    pub fn root(&self) -> &'a Value {
        self.root
    }

    pub fn query(&self) -> &'a str {
        self.query
    }

    /// Evaluate a single path query from the root. Paths without operator
    /// calls are plain structural lookups.
    pub fn evaluate(&self, text: &str) -> Result<Value> {
        let segments = parse_segments(text, self.query)?;

        if !segments.iter().any(Segment::is_call) {
            let keys = segments.iter().filter_map(|segment| match segment {
                Segment::Key(key) => Some(*key),
                Segment::Call(_) => None,
            });
            return utils::deep_get(self.root, keys)
                .cloned()
                .ok_or_else(|| QueryError::path(format!("no object path for {text}"), self.query));
        }

        self.walk(Cow::Borrowed(self.root), &segments)
    }

    /// Apply `segments` starting from `start`.
    pub fn walk(&self, start: Cow<'a, Value>, segments: &[Segment<'_>]) -> Result<Value> {
        let mut current = Some(start);

        for (i, segment) in segments.iter().enumerate() {
            let next = segments.get(i + 1);
            tracing::trace!("step {} of {}: {:?}", i, self.query, segment);

            current = match segment {
                Segment::Key(key) => self.step_key(current.take(), key, next)?,
                Segment::Call(call) => {
                    let owned_base = current.take();
                    let base = owned_base.as_deref();
                    if !call.operator.tolerates_absent() && !base.is_some_and(Value::is_array) {
                        return Err(QueryError::path(
                            format!("{} must follow a sequence", call.raw),
                            self.query,
                        ));
                    }
                    Some(Cow::Owned(self.apply(call, base)?))
                }
            };
        }

        current
            .map(Cow::into_owned)
            .ok_or_else(|| QueryError::path("no final result", self.query))
    }

    fn step_key(
        &self,
        parent: Option<Cow<'a, Value>>,
        key: &str,
        next: Option<&Segment<'_>>,
    ) -> Result<Option<Cow<'a, Value>>> {
        let parent = match parent {
            Some(parent) if parent.is_array() => {
                return Err(QueryError::path(
                    format!("{key} cannot be read from a sequence; follow it with an operator i.e. count(), filter()"),
                    self.query,
                ));
            }
            Some(parent) if !parent.is_null() => parent,
            _ => {
                return Err(QueryError::path(
                    format!("no object exists at {key}"),
                    self.query,
                ));
            }
        };

        let value = child(parent, key);
        let (is_sequence, is_present) = match value.as_deref() {
            Some(v) => (v.is_array(), !v.is_null()),
            None => (false, false),
        };

        match next {
            Some(Segment::Key(_)) if is_sequence => Err(QueryError::path(
                format!("{key} should be followed by operator i.e. count(), filter() as it is an array"),
                self.query,
            )),
            Some(Segment::Key(_)) if !is_present => {
                Err(QueryError::path(format!("no object exists at {key}"), self.query))
            }
            Some(Segment::Call(call)) if !call.operator.tolerates_absent() && !is_sequence => {
                Err(QueryError::path(
                    format!("no sequence exists at {key} for {}", call.raw),
                    self.query,
                ))
            }
            _ => Ok(value),
        }
    }

    fn apply(&self, call: &OperatorCall<'_>, base: Option<&Value>) -> Result<Value> {
        match call.operator {
            Operator::Count => Ok(Value::from(self.sequence(call, base)?.len())),
            Operator::Map => self.map(call, base),
            Operator::Filter => self.filter(call, base),
            Operator::Sum => {
                let items = self.sequence(call, base)?;
                let total = utils::sum_by(items, call.argument.trim());
                Ok(utils::number(utils::round2(total)))
            }
            Operator::Unique => {
                let items = self.sequence(call, base)?;
                Ok(Value::Array(utils::unique_by(items, call.argument.trim())))
            }
            Operator::Mean => self.mean(call, base),
            Operator::Min | Operator::Max => self.extremum(call, base),
            Operator::Range => {
                let values = self.numbers(call, base)?;
                let spread = utils::max(&values)
                    .zip(utils::min(&values))
                    .map_or(0.0, |(hi, lo)| hi - lo);
                Ok(utils::number(spread))
            }
            Operator::Exists => {
                let exists = !utils::is_empty_or_zero(base);
                Ok(Value::String(exists.to_string()))
            }
            Operator::Default => Ok(self.default(call, base)),
            Operator::Age | Operator::Date => self.dates(call, base),
            Operator::Regex => self.regex(call, base),
        }
    }

    fn sequence<'v>(&self, call: &OperatorCall<'_>, base: Option<&'v Value>) -> Result<&'v [Value]> {
        base.and_then(Value::as_array)
            .map(Vec::as_slice)
            .ok_or_else(|| {
                QueryError::path(format!("{} must follow a sequence", call.raw), self.query)
            })
    }

    fn numbers(&self, call: &OperatorCall<'_>, base: Option<&Value>) -> Result<Vec<f64>> {
        utils::numbers(self.sequence(call, base)?).ok_or_else(|| {
            QueryError::type_error(
                format!("in {} the values are not all numbers", call.raw),
                self.query,
            )
        })
    }

    /// Numeric fallback argument of `min`, `max` and `mean`.
    fn numeric_default(&self, call: &OperatorCall<'_>) -> Result<Option<f64>> {
        let argument = call.argument.trim();
        if argument.is_empty() {
            return Ok(None);
        }
        utils::parse_leading_number(argument).map(Some).ok_or_else(|| {
            QueryError::operator(
                format!("default {argument} in {} is not a number", call.raw),
                self.query,
            )
        })
    }

    fn map(&self, call: &OperatorCall<'_>, base: Option<&Value>) -> Result<Value> {
        let key = call.argument.trim();
        let projected = self
            .sequence(call, base)?
            .iter()
            .map(|item| {
                item.get(key).cloned().ok_or_else(|| {
                    QueryError::path(
                        format!("no {key} in parent of {}", call.raw),
                        self.query,
                    )
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Value::Array(utils::flatten_one(projected)))
    }

    fn filter(&self, call: &OperatorCall<'_>, base: Option<&Value>) -> Result<Value> {
        let items = self.sequence(call, base)?;
        let equator = parse_equator(call.argument, self.query)?;
        Ok(Value::Array(
            items
                .iter()
                .filter(|item| equator_matches(&equator, item.get(equator.key)))
                .cloned()
                .collect(),
        ))
    }

    fn mean(&self, call: &OperatorCall<'_>, base: Option<&Value>) -> Result<Value> {
        let values = self.numbers(call, base)?;
        let fallback = self.numeric_default(call)?.unwrap_or(0.0);
        let value = match utils::mean(&values) {
            Some(mean) if mean == 0.0 => 0.0,
            Some(mean) if utils::round2(mean) != 0.0 => utils::round2(mean),
            _ => fallback,
        };
        Ok(utils::number(value))
    }

    fn extremum(&self, call: &OperatorCall<'_>, base: Option<&Value>) -> Result<Value> {
        let values = self.numbers(call, base)?;
        let found = match call.operator {
            Operator::Min => utils::min(&values),
            _ => utils::max(&values),
        };
        let value = match found {
            Some(value) => value,
            None => self.numeric_default(call)?.unwrap_or(0.0),
        };
        Ok(utils::number(value))
    }

    fn default(&self, call: &OperatorCall<'_>, base: Option<&Value>) -> Value {
        if let Some(value) = base.filter(|_| !utils::is_blank(base)) {
            return value.clone();
        }
        let argument = call.argument.trim();
        match utils::parse_leading_number(argument) {
            Some(n) => utils::number(n),
            None => Value::String(utils::strip_quotes(argument)),
        }
    }

    fn dates(&self, call: &OperatorCall<'_>, base: Option<&Value>) -> Result<Value> {
        let mut parts = call.argument.split(',');
        let format: DateFormat = parts
            .next()
            .unwrap_or_default()
            .trim()
            .parse()
            .map_err(|_| {
                QueryError::date(
                    format!("{} should be followed by eligible formatter i.e. YY, MM, DD, HH", call.raw),
                    self.query,
                )
            })?;
        let reference = parts.next().map(str::trim).filter(|r| !r.is_empty());

        let now = match reference {
            Some(path) => utils::deep_get(self.root, path.split('.'))
                .and_then(dates::parse_date)
                .ok_or_else(|| {
                    QueryError::date(
                        format!("in {} the reference {path} is not a valid date", call.raw),
                        self.query,
                    )
                })?,
            None => self.now,
        };

        let stamp = |value: Option<&Value>| -> Result<Value> {
            let invalid = || {
                QueryError::date(
                    format!("in {} the value is not a valid date", call.raw),
                    self.query,
                )
            };
            let date = value.and_then(dates::parse_date).ok_or_else(invalid)?;
            let result = match call.operator {
                Operator::Date => dates::component(date, format),
                _ => dates::age(date, now, format).ok_or_else(invalid)?,
            };
            Ok(Value::from(result))
        };

        match base {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| stamp(Some(item)))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            other => stamp(other),
        }
    }

    fn regex(&self, call: &OperatorCall<'_>, base: Option<&Value>) -> Result<Value> {
        let Some(Value::String(text)) = base else {
            return Err(QueryError::type_error(
                format!("in {} the value is not a string", call.raw),
                self.query,
            ));
        };
        let pattern = Regex::new(call.argument).map_err(|e| {
            QueryError::type_error(
                format!("in {} the pattern is invalid: {e}", call.raw),
                self.query,
            )
        })?;
        let matched = pattern.find(text).map(|m| m.as_str()).unwrap_or_default();
        Ok(Value::String(matched.to_string()))
    }
}

/// Child value at `key`, borrowed when the parent is borrowed.
fn child<'a>(parent: Cow<'a, Value>, key: &str) -> Option<Cow<'a, Value>> {
    match parent {
        Cow::Borrowed(value) => value.get(key).map(Cow::Borrowed),
        Cow::Owned(mut value) => value.get_mut(key).map(|v| Cow::Owned(v.take())),
    }
}

/// Operand as a number the way a loose comparison reads it: blank is zero.
fn operand_number(operand: &str) -> Option<f64> {
    let trimmed = operand.trim();
    if trimmed.is_empty() {
        Some(0.0)
    } else {
        utils::parse_number(trimmed)
    }
}

/// Compare an element's field with the equator operand. Numbers compare
/// numerically, strings lexically, booleans by their string form for `=` and
/// `!=`. Anything incomparable only satisfies `!=`.
fn equator_matches(equator: &Equator<'_>, field: Option<&Value>) -> bool {
    let operand = equator.operand.as_str();
    let ordering = match field {
        Some(Value::Number(n)) => n
            .as_f64()
            .zip(operand_number(operand))
            .and_then(|(left, right)| left.partial_cmp(&right)),
        Some(Value::String(s)) => Some(s.as_str().cmp(operand)),
        Some(Value::Bool(b)) => match equator.comparator {
            Comparator::Eq | Comparator::Ne => Some(b.to_string().as_str().cmp(operand)),
            _ => operand_number(operand).and_then(|right| f64::from(u8::from(*b)).partial_cmp(&right)),
        },
        _ => None,
    };

    match (equator.comparator, ordering) {
        (Comparator::Ne, None) => true,
        (_, None) => false,
        (Comparator::Eq, Some(o)) => o == Ordering::Equal,
        (Comparator::Ne, Some(o)) => o != Ordering::Equal,
        (Comparator::Gt, Some(o)) => o == Ordering::Greater,
        (Comparator::Ge, Some(o)) => o != Ordering::Less,
        (Comparator::Lt, Some(o)) => o == Ordering::Less,
        (Comparator::Le, Some(o)) => o != Ordering::Greater,
    }
}
