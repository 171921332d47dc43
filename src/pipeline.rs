use crate::cardinality::{Cardinality, CardinalityHandle};
use crate::config::{Concurrency, EvalConfig};
use crate::exclusion::{ExclusionBitmap, GENERATOR_CAPACITY_HINT};
use crate::stage::{Element, FnSource, StageRef, VecSource};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// -------- Pipeline --------
/// A lazy chain of stages plus the cardinality and concurrency it will be
/// evaluated with. Cloning is cheap and every clone is independently evaluable.
pub struct Pipeline<T> {
    pub(crate) stage: StageRef<T>,
    pub(crate) cardinality: CardinalityHandle,
    pub(crate) exclusions: Arc<ExclusionBitmap>,
    pub(crate) concurrency: Concurrency,
}

impl<T> Clone for Pipeline<T> {
    fn clone(&self) -> Self {
        Pipeline {
            stage: Arc::clone(&self.stage),
            cardinality: Arc::clone(&self.cardinality),
            exclusions: Arc::clone(&self.exclusions),
            concurrency: self.concurrency,
        }
    }
}

impl<T> fmt::Debug for Pipeline<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stage", &self.stage.label())
            .field("cardinality", &*self.cardinality)
            .field("concurrency", &self.concurrency.get())
            .finish()
    }
}

/// Build a pipeline over `data`. The domain length is `data.len()`.
pub fn from_vec<T: Element + Clone>(data: Vec<T>) -> Pipeline<T> {
    let len = data.len();
    Pipeline {
        stage: Arc::new(VecSource(Arc::from(data))),
        cardinality: Arc::new(Cardinality::Domain(len)),
        exclusions: Arc::new(ExclusionBitmap::with_capacity(len)),
        concurrency: Concurrency::default(),
    }
}

/// Build a pipeline over a copy of `data`; later changes to `data` are not seen.
pub fn from_slice<T: Element + Clone>(data: &[T]) -> Pipeline<T> {
    from_vec(data.to_vec())
}

/// Build a pipeline from a generator `index -> Option<T>`.
///
/// `None` marks the index as absent. The length is unknown, so call
/// [`generate`](Pipeline::generate) or [`take`](Pipeline::take) before evaluating;
/// an unconfigured generator pipeline evaluates to nothing.
pub fn from_fn<T, F>(f: F) -> Pipeline<T>
where
    T: Element,
    F: Fn(usize) -> Option<T> + Send + Sync + 'static,
{
    Pipeline {
        stage: Arc::new(FnSource(f, PhantomData)),
        cardinality: Arc::new(Cardinality::Unset),
        exclusions: Arc::new(ExclusionBitmap::with_capacity(GENERATOR_CAPACITY_HINT)),
        concurrency: Concurrency::default(),
    }
}

impl<T: Element> Pipeline<T> {
    /// Probe exactly `n` source positions in parallel.
    ///
    /// Ignored if a domain length or result limit is already set.
    #[must_use]
    pub fn generate(mut self, n: usize) -> Self {
        if self.cardinality.is_unset() {
            self.cardinality = Arc::new(Cardinality::Unset.with_domain(n));
        }
        self
    }

    /// Stop once `n` elements survive, probing sequentially.
    ///
    /// Ignored if a domain length or result limit is already set, and for `n == 0`.
    #[must_use]
    pub fn take(mut self, n: usize) -> Self {
        if self.cardinality.is_unset() {
            self.cardinality = Arc::new(Cardinality::Unset.with_limit(n));
        }
        self
    }

    /// Like [`generate`](Self::generate); negative `n` is ignored.
    #[must_use]
    pub fn generate_signed(self, n: i64) -> Self {
        match usize::try_from(n) {
            Ok(n) => self.generate(n),
            Err(_) => self,
        }
    }

    /// Like [`take`](Self::take); negative `n` is ignored.
    #[must_use]
    pub fn take_signed(self, n: i64) -> Self {
        match usize::try_from(n) {
            Ok(n) => self.take(n),
            Err(_) => self,
        }
    }

    /// Set the number of parallel workers. `0` is ignored; values above
    /// [`MAX_CONCURRENCY`](crate::config::MAX_CONCURRENCY) are clamped.
    #[must_use]
    pub fn parallel(mut self, n: usize) -> Self {
        if let Some(c) = Concurrency::new(n) {
            self.concurrency = c;
        }
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: EvalConfig) -> Self {
        self.concurrency = config.concurrency;
        self
    }

    pub fn cardinality(&self) -> Cardinality {
        *self.cardinality
    }

    pub fn concurrency(&self) -> Concurrency {
        self.concurrency
    }

    /// Indices rejected by filter stages so far.
    ///
    /// One bitmap is shared by every pipeline derived from the same source, so
    /// it also holds marks from sibling branches whose filters ran. Marks are
    /// never cleared between evaluations, and for generator sources the bitmap
    /// grows to the highest rejected index. Treat it as a diagnostic record, not
    /// as the exclusion set of this pipeline alone.
    pub fn exclusions(&self) -> &ExclusionBitmap {
        &self.exclusions
    }
}
