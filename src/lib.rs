//! Evaluate compact, dot-delimited queries against in-memory JSON documents.
//!
//! ```ignore
//! let evaluator = oneliner::Evaluator::new(document);
//! let max_ncd = evaluator.query("additional_drivers.map(ncd).max(5)")?;
//! ```

pub mod config;
pub mod dsl;
pub mod error;
pub mod evaluator;
pub mod extract;
pub mod utils;

pub use error::{ErrorKind, QueryError, Result};
pub use evaluator::Evaluator;
