//! Query micro-DSL over JSON documents.
//!
//! Syntax:
//!   a.b.c                   - structural lookup
//!   a.b.count()             - length of a sequence
//!   a.b.map(k)              - project field k, flattening one level
//!   a.b.filter(k=v)         - keep elements matching =, !=, >, >=, <, <=
//!   a.b.sum(k)              - sum of field k, 2 decimals
//!   a.b.unique(k)           - first element per distinct k
//!   xs.mean(d)              - average, d if empty
//!   xs.min(d), xs.max(d)    - extremum, d if empty
//!   xs.range()              - max - min
//!   a.b.exists()            - "true"/"false"
//!   a.b.default(d)          - d if absent, null or ""
//!   a.dob.date(YY|MM|DD|HH) - UTC calendar component
//!   a.dob.age(fmt[, path])  - elapsed time to now, or to the date at path
//!   a.b.regex(pattern)      - first match or ""
//!   max([q1, q2, 10])       - also min([...]) and range([...])
//!   each.a.rest             - rest applied to every element of a

mod ast;
mod combinator;
mod dates;
mod eval;
mod lexer;
mod parser;

pub use ast::*;
pub use combinator::{aggregate, broadcast};
pub use dates::{age, component, parse_date};
pub use eval::Navigator;
pub use parser::{parse_equator, parse_form, parse_segments, validate};
