//! Errors reported by the checked evaluation entry points.
//!
//! The unchecked API (`collect`, `count`, `reduce`) never fails; it degrades to
//! empty or partial results. `try_collect`/`try_count` surface those cases as
//! [`EvalError`] wrapped in `anyhow::Error`.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    /// Neither a domain length nor a result limit was configured.
    Unconfigured,
    /// The source ran out of addressable indices before the limit was met.
    Shortfall { requested: usize, produced: usize },
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::Unconfigured => {
                write!(f, "pipeline has neither a domain length nor a result limit")
            }
            EvalError::Shortfall { requested, produced } => {
                write!(f, "requested {requested} elements but the source produced {produced}")
            }
        }
    }
}

impl std::error::Error for EvalError {}
