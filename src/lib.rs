//! # Lazybeam
//!
//! A **lazy sequence pipeline** for Rust. Build a chain of element-wise
//! transforms and filters over an in-memory collection or an index-driven
//! generator, then evaluate it once, either sequentially up to a requested
//! count or in parallel across a known domain.
//!
//! ## Quick Start
//!
//! ```
//! use lazybeam::*;
//!
//! let evens = from_vec(vec![1, 2, 3, 4, 5]).filter(|x: &i32| x % 2 == 0);
//! assert_eq!(evens.collect(), vec![2, 4]);
//!
//! let squares = from_fn(|i| (i < 5).then_some(i * i)).generate(5).parallel(2);
//! assert_eq!(squares.collect(), vec![0, 1, 4, 9, 16]);
//!
//! let naturals = from_fn(Some).take(3);
//! assert_eq!(naturals.collect(), vec![0, 1, 2]);
//! ```
//!
//! ## Core Concepts
//!
//! ### Pipeline
//!
//! A [`Pipeline<T>`] is a composed [`Stage`](stage::Stage): a function from a
//! source index to either an element or "nothing here". Transforms wrap the
//! previous stage instead of building intermediate collections, so:
//! - **Lazy** - no work happens until `collect`, `count`, `reduce` or `fold`
//! - **Re-runnable** - every evaluation re-probes the whole chain
//! - **Cheap to branch** - a pipeline stays valid after deriving new ones from it
//!
//! ### Cardinality
//!
//! Exactly one of the following decides how a pipeline is evaluated:
//! - a **domain length**: set by [`from_vec`] or [`generate`](Pipeline::generate);
//!   every index in `0..len` is probed in parallel
//! - a **result limit**: set by [`take`](Pipeline::take); indices are probed in
//!   order until that many elements survive
//!
//! The first one set wins. A generator pipeline with neither evaluates to an
//! empty result. Configure cardinality before chaining further stages; see
//! [`cardinality`] for why.
//!
//! ### Execution
//!
//! Parallel evaluation runs on a rayon pool of [`parallel`](Pipeline::parallel)
//! workers (default 4, at most 256). Output order is always source-index order.
//! Worker width changes throughput, never results.
//!
//! ## Module Overview
//!
//! - [`pipeline`] - `Pipeline` type, sources and configuration
//! - [`collection`] - transforms and evaluation entry points
//! - [`stage`] - the lazy accessor stages
//! - [`cardinality`] - domain length vs. result limit
//! - [`runner`] - sequential and parallel evaluation
//! - [`exclusion`] - per-index exclusion bitmap fed by filters
//! - [`config`] - concurrency settings
//! - [`stats`] - per-evaluation statistics
//! - [`testing`] - assertion helpers

pub mod cardinality;
pub mod collection;
pub mod config;
pub mod error;
pub mod exclusion;
pub mod pipeline;
pub mod runner;
pub mod stage;
pub mod stats;
pub mod testing;

// General re-exports
pub use cardinality::{Cardinality, Strategy};
pub use config::{Concurrency, DEFAULT_CONCURRENCY, EvalConfig, MAX_CONCURRENCY};
pub use error::EvalError;
pub use exclusion::{ExclusionBitmap, ExclusionSink};
pub use pipeline::{Pipeline, from_fn, from_slice, from_vec};
pub use stage::{Element, Outcome, Stage};
pub use stats::EvalStats;
