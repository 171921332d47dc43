//! Cardinality state: how many source positions to probe, or how many results
//! to stop at.
//!
//! A pipeline has exactly one of three states. The state lives behind an `Arc`
//! that every stage built from the pipeline shares. Setting a cardinality
//! installs a *new* handle on the pipeline it is called on, so pipelines that
//! were derived earlier keep whatever they captured at construction time.
//! Configure cardinality before chaining further stages.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FormatResult};
use std::sync::Arc;

/// Known domain length or requested result count. The two are exclusive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cardinality {
    /// Neither is set; evaluation yields nothing.
    #[default]
    Unset,
    /// Probe exactly this many source positions (in parallel).
    Domain(usize),
    /// Probe sequentially until this many elements survive.
    Limit(usize),
}

/// Shared handle to a pipeline's cardinality.
pub type CardinalityHandle = Arc<Cardinality>;

/// How the runner evaluates a pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strategy {
    /// Nothing configured: empty result, zero count.
    Empty,
    /// Single-threaded probe of `0, 1, 2, …` until `limit` survivors.
    Sequential { limit: usize },
    /// Fork-join probe of every index in `0..domain`.
    Parallel { domain: usize },
}

impl Cardinality {
    #[must_use]
    pub fn is_unset(&self) -> bool {
        matches!(self, Cardinality::Unset)
    }

    pub fn domain(&self) -> Option<usize> {
        match *self {
            Cardinality::Domain(n) => Some(n),
            _ => None,
        }
    }

    pub fn limit(&self) -> Option<usize> {
        match *self {
            Cardinality::Limit(n) => Some(n),
            _ => None,
        }
    }

    /// Apply a domain length. First writer wins.
    #[must_use]
    pub fn with_domain(self, n: usize) -> Self {
        match self {
            Cardinality::Unset => Cardinality::Domain(n),
            other => other,
        }
    }

    /// Apply a result limit. First writer wins; a limit of zero means "unset".
    #[must_use]
    pub fn with_limit(self, n: usize) -> Self {
        match self {
            Cardinality::Unset if n > 0 => Cardinality::Limit(n),
            other => other,
        }
    }

    #[must_use]
    pub fn strategy(&self) -> Strategy {
        match *self {
            Cardinality::Unset => Strategy::Empty,
            Cardinality::Limit(limit) => Strategy::Sequential { limit },
            Cardinality::Domain(domain) => Strategy::Parallel { domain },
        }
    }
}

impl Display for Strategy {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        match self {
            Strategy::Empty => write!(f, "empty"),
            Strategy::Sequential { limit } => write!(f, "sequential(limit={limit})"),
            Strategy::Parallel { domain } => write!(f, "parallel(domain={domain})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_writer_wins() {
        let c = Cardinality::Unset.with_limit(3).with_domain(9).with_limit(7);
        assert_eq!(c, Cardinality::Limit(3));
        let c = Cardinality::Unset.with_domain(0).with_limit(2);
        assert_eq!(c, Cardinality::Domain(0));
    }

    #[test]
    fn zero_limit_stays_unset() {
        let c = Cardinality::Unset.with_limit(0);
        assert!(c.is_unset());
        assert_eq!(c.with_domain(4).strategy(), Strategy::Parallel { domain: 4 });
    }
}
