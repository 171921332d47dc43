//! Evaluation configuration.
//!
//! The only tunable today is the worker width of the parallel strategy. Values
//! are validated on the way in: widths below one are rejected and widths above
//! [`MAX_CONCURRENCY`] are clamped.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Worker width used when none is configured.
pub const DEFAULT_CONCURRENCY: usize = 4;
/// Upper bound on worker width.
pub const MAX_CONCURRENCY: usize = 256;

/// Number of concurrent workers for parallel evaluation, in `1..=256`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct Concurrency(usize);

impl Concurrency {
    /// `None` if `n < 1`; values above [`MAX_CONCURRENCY`] are clamped.
    #[must_use]
    pub fn new(n: usize) -> Option<Self> {
        (n >= 1).then(|| Self(n.min(MAX_CONCURRENCY)))
    }

    /// One worker per logical CPU.
    #[must_use]
    pub fn available() -> Self {
        Self(num_cpus::get().clamp(1, MAX_CONCURRENCY))
    }

    #[inline]
    #[must_use]
    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for Concurrency {
    fn default() -> Self {
        Self(DEFAULT_CONCURRENCY)
    }
}

impl TryFrom<usize> for Concurrency {
    type Error = String;

    fn try_from(n: usize) -> std::result::Result<Self, Self::Error> {
        Self::new(n).ok_or_else(|| format!("concurrency must be at least 1, got {n}"))
    }
}

impl From<Concurrency> for usize {
    fn from(c: Concurrency) -> Self {
        c.0
    }
}

/// Serializable evaluation settings.
///
/// ```
/// use lazybeam::config::EvalConfig;
///
/// let cfg = EvalConfig::from_json_str(r#"{ "concurrency": 8 }"#).unwrap();
/// assert_eq!(cfg.concurrency.get(), 8);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    pub concurrency: Concurrency,
}

impl EvalConfig {
    /// Parse settings from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not valid JSON or a field is out of range.
    pub fn from_json_str(s: &str) -> Result<Self> {
        serde_json::from_str(s).context("invalid evaluation config")
    }

    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to serialize evaluation config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_and_clamps_high() {
        assert_eq!(Concurrency::new(0), None);
        assert_eq!(Concurrency::new(1).map(Concurrency::get), Some(1));
        assert_eq!(Concurrency::new(10_000).map(Concurrency::get), Some(MAX_CONCURRENCY));
        assert_eq!(Concurrency::default().get(), DEFAULT_CONCURRENCY);
    }

    #[test]
    fn json_config() {
        assert_eq!(EvalConfig::from_json_str("{}").unwrap(), EvalConfig::default());
        let cfg = EvalConfig::from_json_str(r#"{"concurrency": 999}"#).unwrap();
        assert_eq!(cfg.concurrency.get(), MAX_CONCURRENCY);
        assert!(EvalConfig::from_json_str(r#"{"concurrency": 0}"#).is_err());
        assert!(EvalConfig::from_json_str("not json").is_err());
    }
}
