//! Evaluation engine.
//!
//! The runner turns a composed [`Stage`] plus its [`Cardinality`] into a
//! concrete, ordered `Vec<T>`. Two strategies exist and they never mix:
//!
//! - **Sequential** (a result limit is set): probe `0, 1, 2, …` on the calling
//!   thread until enough elements survive.
//! - **Parallel** (a domain length is set): probe every index in `0..domain`
//!   exactly once on a rayon pool of `concurrency` workers, each probe writing
//!   its own slot, then compact the slots in index order.
//!
//! Evaluation is a fork-join barrier: callers see nothing until every probe has
//! finished, and the output order is always source-index order regardless of
//! which worker finished first.

use crate::cardinality::{Cardinality, Strategy};
use crate::config::Concurrency;
use crate::error::EvalError;
use crate::stage::{Element, Outcome, Stage};
use crate::stats::EvalStats;
use log::{debug, warn};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use anyhow::{Result, bail};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

/// Cap on up-front allocation for the sequential strategy.
const PREALLOC_LIMIT: usize = 1 << 16;

/// Whether an evaluation keeps the surviving elements or only counts them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Collect {
    Elements,
    CountOnly,
}

/// Result of one evaluation.
pub(crate) struct Evaluation<T> {
    pub items: Vec<T>,
    pub stats: EvalStats,
}

impl<T> Evaluation<T> {
    /// True when a limit was requested and the source could not meet it.
    pub fn is_short(&self) -> bool {
        match self.stats.strategy {
            Strategy::Sequential { limit } => self.stats.kept < limit,
            _ => false,
        }
    }

    /// Turn an unmet result limit into [`EvalError::Shortfall`].
    pub fn into_checked(self) -> Result<Self> {
        match self.stats.strategy {
            Strategy::Sequential { limit } if self.stats.kept < limit => {
                bail!(EvalError::Shortfall { requested: limit, produced: self.stats.kept })
            }
            _ => Ok(self),
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Runner {
    pub concurrency: Concurrency,
}

impl Runner {
    pub fn run<T: Element>(
        &self,
        stage: &dyn Stage<T>,
        cardinality: Cardinality,
        collect: Collect,
    ) -> Evaluation<T> {
        let strategy = cardinality.strategy();
        debug!(
            "evaluating {} via {strategy} ({collect:?}, width {})",
            stage.label(),
            self.concurrency.get()
        );
        let start = Instant::now();
        let mut eval = match strategy {
            Strategy::Empty => Evaluation { items: Vec::new(), stats: EvalStats::empty() },
            Strategy::Sequential { limit } => exec_to_limit(stage, limit, collect),
            Strategy::Parallel { domain } => {
                exec_parallel(stage, domain, self.concurrency.get(), collect)
            }
        };
        eval.stats.elapsed = start.elapsed();
        debug!(
            "evaluation done: probed={} kept={} skipped={} in {:?}",
            eval.stats.probed, eval.stats.kept, eval.stats.skipped, eval.stats.elapsed
        );
        eval
    }
}

/// Sequential, limit-driven probe loop.
///
/// Stops at `limit` survivors. If the index space runs out first, whatever was
/// collected is returned.
fn exec_to_limit<T: Element>(stage: &dyn Stage<T>, limit: usize, collect: Collect) -> Evaluation<T> {
    exec_to_limit_from(stage, 0, limit, collect)
}

fn exec_to_limit_from<T: Element>(
    stage: &dyn Stage<T>,
    start: usize,
    limit: usize,
    collect: Collect,
) -> Evaluation<T> {
    let mut items = match collect {
        Collect::Elements => Vec::with_capacity(limit.min(PREALLOC_LIMIT)),
        Collect::CountOnly => Vec::new(),
    };
    let mut kept = 0usize;
    let mut probed = 0usize;
    let mut index = start;

    while kept < limit {
        probed = probed.saturating_add(1);
        if let Outcome::Kept(v) = stage.probe(index) {
            kept += 1;
            if collect == Collect::Elements {
                items.push(v);
            }
        }
        if index == usize::MAX {
            warn!("index space exhausted after {kept} of {limit} requested elements");
            break;
        }
        index += 1;
    }

    Evaluation {
        items,
        stats: EvalStats {
            strategy: Strategy::Sequential { limit },
            probed,
            kept,
            skipped: probed - kept,
            concurrency: 1,
            elapsed: Default::default(),
        },
    }
}

/// Parallel, domain-driven fork-join over `0..domain`.
fn exec_parallel<T: Element>(
    stage: &dyn Stage<T>,
    domain: usize,
    width: usize,
    collect: Collect,
) -> Evaluation<T> {
    let skipped = AtomicUsize::new(0);
    let probe = |i: usize| {
        let out = stage.probe(i);
        if out.is_skipped() {
            skipped.fetch_add(1, Ordering::Relaxed);
        }
        out
    };

    let pool = pool_for(width);
    let pooled = pool.is_some();
    let items = match pool {
        Some(pool) => pool.install(|| match collect {
            Collect::Elements => {
                // Indexed collect: slot `i` is written only by the probe of index `i`.
                let slots: Vec<Outcome<T>> = (0..domain).into_par_iter().map(probe).collect();
                compact(slots, domain - skipped.load(Ordering::Relaxed))
            }
            Collect::CountOnly => {
                (0..domain).into_par_iter().for_each(|i| {
                    probe(i);
                });
                Vec::new()
            }
        }),
        None => match collect {
            Collect::Elements => {
                let slots: Vec<Outcome<T>> = (0..domain).map(probe).collect();
                compact(slots, domain - skipped.load(Ordering::Relaxed))
            }
            Collect::CountOnly => {
                (0..domain).for_each(|i| {
                    probe(i);
                });
                Vec::new()
            }
        },
    };

    let skipped = skipped.into_inner();
    Evaluation {
        items,
        stats: EvalStats {
            strategy: Strategy::Parallel { domain },
            probed: domain,
            kept: domain - skipped,
            skipped,
            concurrency: if pooled { width } else { 1 },
            elapsed: Default::default(),
        },
    }
}

fn compact<T>(slots: Vec<Outcome<T>>, survivors: usize) -> Vec<T> {
    let mut items = Vec::with_capacity(survivors);
    items.extend(slots.into_iter().filter_map(Outcome::into_option));
    items
}

/// Pool with exactly `width` workers.
///
/// Only the most recently requested width is cached. Asking for another width
/// replaces it, and the old pool's threads exit once in-flight evaluations drop
/// their handle. `None` means no pool could be built; the caller then probes on
/// its own thread so parallelism never exceeds `width`.
fn pool_for(width: usize) -> Option<Arc<ThreadPool>> {
    static POOL: Mutex<Option<(usize, Arc<ThreadPool>)>> = Mutex::new(None);
    let mut cached = POOL.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some((w, pool)) = cached.as_ref() {
        if *w == width {
            return Some(Arc::clone(pool));
        }
    }
    match ThreadPoolBuilder::new()
        .num_threads(width)
        .thread_name(move |i| format!("lazybeam-{width}-{i}"))
        .build()
    {
        Ok(pool) => {
            let pool = Arc::new(pool);
            *cached = Some((width, Arc::clone(&pool)));
            Some(pool)
        }
        Err(e) => {
            warn!("could not build a {width}-worker pool, probing on the calling thread: {e}");
            None
        }
    }
}
