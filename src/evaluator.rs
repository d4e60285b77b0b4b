//! Query entry point.

use serde_json::Value;
use time::OffsetDateTime;

use crate::dsl::{Navigator, QueryForm, aggregate, broadcast, parse_form};
use crate::error::Result;

/// Evaluates queries against one JSON document.
///
/// The document is never modified; queries take `&self`, so one evaluator can
/// serve many threads.
#[derive(Debug, Clone)]
pub struct Evaluator {
    document: Value,
    now: Option<OffsetDateTime>,
}

impl Evaluator {
    pub fn new(document: Value) -> Self {
        Evaluator {
            document,
            now: None,
        }
    }

    /// Pin the instant `age()` measures against when no reference path is
    /// given. Defaults to the wall clock, read once per query.
    pub fn at(mut self, now: OffsetDateTime) -> Self {
        self.now = Some(now);
        self
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Evaluate `query`, returning a new value or the first error.
    pub fn query(&self, query: &str) -> Result<Value> {
        let now = self.now.unwrap_or_else(OffsetDateTime::now_utc);
        let nav = Navigator::new(&self.document, query, now);

        let form = parse_form(query)?;
        tracing::debug!("Evaluating {:?}", form);

        let result = match form {
            QueryForm::Combinator { aggregate: kind, body } => aggregate(&nav, kind, body),
            QueryForm::Broadcast(body) => broadcast(&nav, body),
            QueryForm::Path(path) => nav.evaluate(path),
        };

        if let Err(e) = &result {
            tracing::debug!("Query failed: {}", e);
        }
        result
    }
}
