//! Extraction rules for derived fields.
//!
//! A rule set names queries and evaluates all of them against one document,
//! producing a JSON object keyed by field name.

mod rules;

pub use rules::{RuleSet, evaluate_rules};
