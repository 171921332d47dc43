//! Transforms and evaluation entry points for [`Pipeline`].
//!
//! Transforms wrap the current stage and return a new pipeline; nothing runs
//! until one of the evaluation methods is called. Every evaluation re-runs the
//! full stage chain from scratch.

use crate::error::EvalError;
use crate::pipeline::Pipeline;
use crate::runner::{Collect, Evaluation, Runner};
use crate::stage::{Element, FilterStage, InspectStage, MapStage, StageRef};
use crate::stats::EvalStats;
use anyhow::{Result, bail};
use std::marker::PhantomData;
use std::sync::Arc;

impl<T: Element> Pipeline<T> {
    fn derive<O>(&self, stage: StageRef<O>) -> Pipeline<O> {
        Pipeline {
            stage,
            cardinality: Arc::clone(&self.cardinality),
            exclusions: Arc::clone(&self.exclusions),
            concurrency: self.concurrency,
        }
    }

    /// Transform each element.
    pub fn map<O, F>(&self, f: F) -> Pipeline<O>
    where
        O: Element,
        F: Fn(T) -> O + Send + Sync + 'static,
    {
        self.derive(Arc::new(MapStage { inner: Arc::clone(&self.stage), f, _o: PhantomData }))
    }

    /// Keep elements matching `pred`. Rejected indices are marked in
    /// [`exclusions`](Pipeline::exclusions).
    pub fn filter<P>(&self, pred: P) -> Pipeline<T>
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.derive(Arc::new(FilterStage {
            inner: Arc::clone(&self.stage),
            pred,
            sink: self.exclusions.clone(),
        }))
    }

    /// Observe each surviving element with its source index.
    ///
    /// Under parallel evaluation `f` is called from worker threads in no
    /// particular order.
    pub fn inspect<F>(&self, f: F) -> Pipeline<T>
    where
        F: Fn(usize, &T) + Send + Sync + 'static,
    {
        self.derive(Arc::new(InspectStage { inner: Arc::clone(&self.stage), f }))
    }

    fn run(&self, collect: Collect) -> Evaluation<T> {
        let runner = Runner { concurrency: self.concurrency };
        runner.run(self.stage.as_ref(), *self.cardinality, collect)
    }

    fn run_checked(&self, collect: Collect) -> Result<Evaluation<T>> {
        if self.cardinality.is_unset() {
            bail!(EvalError::Unconfigured);
        }
        self.run(collect).into_checked()
    }

    /// Evaluate and return the surviving elements in source order.
    ///
    /// Returns an empty vec if neither [`generate`](Pipeline::generate) nor
    /// [`take`](Pipeline::take) applies.
    pub fn collect(&self) -> Vec<T> {
        self.run(Collect::Elements).items
    }

    /// Number of surviving elements.
    ///
    /// With a result limit this is the limit itself and nothing is evaluated.
    pub fn count(&self) -> usize {
        if let Some(limit) = self.cardinality().limit() {
            return limit;
        }
        self.run(Collect::CountOnly).stats.kept
    }

    /// Left-fold the surviving elements, seeded with the first one.
    pub fn reduce<F>(&self, f: F) -> Option<T>
    where
        F: FnMut(T, T) -> T,
    {
        self.collect().into_iter().reduce(f)
    }

    /// Left-fold the surviving elements from `init`.
    pub fn fold<A, F>(&self, init: A, f: F) -> A
    where
        F: FnMut(A, T) -> A,
    {
        self.collect().into_iter().fold(init, f)
    }

    /// [`collect`](Self::collect) plus a record of what the evaluation did.
    pub fn collect_with_stats(&self) -> (Vec<T>, EvalStats) {
        let eval = self.run(Collect::Elements);
        (eval.items, eval.stats)
    }

    /// Like [`collect`](Self::collect), but reports an unconfigured pipeline or
    /// an unmet result limit as an error.
    ///
    /// # Errors
    ///
    /// [`EvalError::Unconfigured`] or [`EvalError::Shortfall`].
    pub fn try_collect(&self) -> Result<Vec<T>> {
        Ok(self.run_checked(Collect::Elements)?.items)
    }

    /// Like [`count`](Self::count), but evaluates even when a limit is set so
    /// that a shortfall can be detected.
    ///
    /// # Errors
    ///
    /// [`EvalError::Unconfigured`] or [`EvalError::Shortfall`].
    pub fn try_count(&self) -> Result<usize> {
        Ok(self.run_checked(Collect::CountOnly)?.stats.kept)
    }
}
