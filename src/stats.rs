//! Per-evaluation statistics.
//!
//! [`EvalStats`] is a small record of what one evaluation did: which strategy
//! ran, how many indices were probed, and how many survived. It serializes to
//! JSON for reporting.

use crate::cardinality::Strategy;
use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EvalStats {
    pub strategy: Strategy,
    /// Indices handed to the composed stage.
    pub probed: usize,
    /// Indices that produced an element.
    pub kept: usize,
    /// Indices that were filtered out or past the end of the source.
    pub skipped: usize,
    /// Worker width used; `1` for the sequential strategy or when no pool could be built.
    pub concurrency: usize,
    #[serde(rename = "elapsed_ms", serialize_with = "as_millis")]
    pub elapsed: Duration,
}

impl EvalStats {
    pub(crate) fn empty() -> Self {
        Self {
            strategy: Strategy::Empty,
            probed: 0,
            kept: 0,
            skipped: 0,
            concurrency: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn as_millis<S: serde::Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}
