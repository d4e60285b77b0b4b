//! Rule set construction and evaluation.

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::Evaluator;
use crate::config::{FieldRule, OnError, RulesConfig};
use crate::dsl::validate;

/// Validated, ordered field rules.
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub fields: Vec<FieldRule>,
}

impl RuleSet {
    /// Check every rule's query syntax and that field names are unique.
    pub fn compile(config: &RulesConfig) -> Result<Self> {
        let mut names = HashSet::new();

        for (i, field) in config.fields.iter().enumerate() {
            if !names.insert(field.name.as_str()) {
                anyhow::bail!("Rules: duplicate field name '{}'", field.name);
            }
            validate(&field.query).map_err(|e| {
                anyhow::anyhow!("Error parsing rule {} ('{}'): {}", i + 1, field.name, e)
            })?;
        }

        Ok(RuleSet {
            fields: config.fields.clone(),
        })
    }

    /// A rule set with one field per query, named by the query text.
    pub fn from_queries(queries: &[String]) -> Result<Self> {
        let config = RulesConfig {
            now: None,
            fields: queries
                .iter()
                .map(|query| FieldRule {
                    name: query.clone(),
                    query: query.clone(),
                    on_error: OnError::Fail,
                })
                .collect(),
        };
        Self::compile(&config)
    }
}

/// Evaluate every rule against the evaluator's document, in rule order.
pub fn evaluate_rules(rules: &RuleSet, evaluator: &Evaluator) -> Result<Map<String, Value>> {
    let mut out = Map::new();

    for field in &rules.fields {
        match evaluator.query(&field.query) {
            Ok(value) => {
                out.insert(field.name.clone(), value);
            }
            Err(e) => match field.on_error {
                OnError::Fail => {
                    return Err(e).with_context(|| format!("Rules: field '{}' failed", field.name));
                }
                OnError::Null => {
                    tracing::debug!("Field '{}' set to null: {}", field.name, e);
                    out.insert(field.name.clone(), Value::Null);
                }
                OnError::Skip => {
                    tracing::debug!("Field '{}' skipped: {}", field.name, e);
                }
            },
        }
    }

    Ok(out)
}
