//! Lazy accessor stages.
//!
//! A pipeline is a chain of [`Stage`]s. Each stage answers a single question:
//! "what is the element at source index `i`, if any?" Downstream stages wrap
//! their upstream stage and never see a materialized collection, so nothing is
//! computed until the runner probes an index.
//!
//! Stages are stateless between probes, which is what lets the runner call
//! [`Stage::probe`] from many worker threads at once.

use crate::exclusion::ExclusionSink;
use std::marker::PhantomData;
use std::sync::Arc;

/// Marker bound for types that can flow through a pipeline.
pub trait Element: 'static + Send + Sync {}
impl<T> Element for T where T: 'static + Send + Sync {}

/// Result of probing a stage at one index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The index holds a surviving element.
    Kept(T),
    /// The index is past the end of the source or was filtered out.
    Skipped,
}

impl<T> Outcome<T> {
    #[inline]
    pub fn is_skipped(&self) -> bool {
        matches!(self, Outcome::Skipped)
    }

    #[inline]
    pub fn into_option(self) -> Option<T> {
        match self {
            Outcome::Kept(v) => Some(v),
            Outcome::Skipped => None,
        }
    }
}

/// A lazily evaluated accessor `index -> Outcome`.
pub trait Stage<T>: Send + Sync {
    fn probe(&self, index: usize) -> Outcome<T>;

    /// Short label used in debug logs.
    fn label(&self) -> &'static str {
        "stage"
    }
}

/// Shared handle to a stage; cloning is cheap.
pub type StageRef<T> = Arc<dyn Stage<T>>;

// ---- sources ----

/// Source over an owned copy of a collection.
pub(crate) struct VecSource<T>(pub(crate) Arc<[T]>);

impl<T: Element + Clone> Stage<T> for VecSource<T> {
    fn probe(&self, index: usize) -> Outcome<T> {
        match self.0.get(index) {
            Some(v) => Outcome::Kept(v.clone()),
            None => Outcome::Skipped,
        }
    }

    fn label(&self) -> &'static str {
        "vec-source"
    }
}

/// Source backed by a caller-supplied generator `index -> Option<T>`.
pub(crate) struct FnSource<T, F>(pub(crate) F, pub(crate) PhantomData<fn() -> T>);

impl<T, F> Stage<T> for FnSource<T, F>
where
    T: Element,
    F: Fn(usize) -> Option<T> + Send + Sync + 'static,
{
    fn probe(&self, index: usize) -> Outcome<T> {
        match (self.0)(index) {
            Some(v) => Outcome::Kept(v),
            None => Outcome::Skipped,
        }
    }

    fn label(&self) -> &'static str {
        "fn-source"
    }
}

// ---- element-wise stages ----

pub(crate) struct MapStage<I, O, F> {
    pub(crate) inner: StageRef<I>,
    pub(crate) f: F,
    pub(crate) _o: PhantomData<fn() -> O>,
}

impl<I, O, F> Stage<O> for MapStage<I, O, F>
where
    I: Element,
    O: Element,
    F: Fn(I) -> O + Send + Sync + 'static,
{
    fn probe(&self, index: usize) -> Outcome<O> {
        match self.inner.probe(index) {
            Outcome::Kept(v) => Outcome::Kept((self.f)(v)),
            Outcome::Skipped => Outcome::Skipped,
        }
    }

    fn label(&self) -> &'static str {
        "map"
    }
}

pub(crate) struct FilterStage<T, P> {
    pub(crate) inner: StageRef<T>,
    pub(crate) pred: P,
    pub(crate) sink: Arc<dyn ExclusionSink>,
}

impl<T, P> Stage<T> for FilterStage<T, P>
where
    T: Element,
    P: Fn(&T) -> bool + Send + Sync + 'static,
{
    fn probe(&self, index: usize) -> Outcome<T> {
        match self.inner.probe(index) {
            Outcome::Kept(v) if (self.pred)(&v) => Outcome::Kept(v),
            Outcome::Kept(_) => {
                self.sink.mark(index);
                Outcome::Skipped
            }
            Outcome::Skipped => Outcome::Skipped,
        }
    }

    fn label(&self) -> &'static str {
        "filter"
    }
}

/// Passes elements through unchanged after handing them to a callback.
pub(crate) struct InspectStage<T, F> {
    pub(crate) inner: StageRef<T>,
    pub(crate) f: F,
}

impl<T, F> Stage<T> for InspectStage<T, F>
where
    T: Element,
    F: Fn(usize, &T) + Send + Sync + 'static,
{
    fn probe(&self, index: usize) -> Outcome<T> {
        let out = self.inner.probe(index);
        if let Outcome::Kept(v) = &out {
            (self.f)(index, v);
        }
        out
    }

    fn label(&self) -> &'static str {
        "inspect"
    }
}
