//! Per-index exclusion tracking.
//!
//! Filter stages report every index they reject to an [`ExclusionSink`]. The
//! runner does not read these marks back (each probe already reports its own
//! [`Outcome`](crate::stage::Outcome)); the bitmap is kept for diagnostics and
//! for compaction-style stages that need to know which source slots are gone.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

/// Capacity hint used for generator sources, whose length is not known up front.
pub const GENERATOR_CAPACITY_HINT: usize = 1024;

const WORD_BITS: usize = u64::BITS as usize;

/// Capability to mark a source index as permanently excluded.
pub trait ExclusionSink: Send + Sync {
    fn mark(&self, index: usize);
}

/// Thread-safe bitmap of excluded indices.
///
/// The bitmap starts sized for `capacity` bits and grows on demand when an index
/// past the end is marked, so the capacity hint does not have to match the
/// domain length.
#[derive(Debug, Default)]
pub struct ExclusionBitmap {
    words: RwLock<Vec<AtomicU64>>,
}

impl ExclusionBitmap {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let n = capacity.div_ceil(WORD_BITS);
        Self { words: RwLock::new((0..n).map(|_| AtomicU64::new(0)).collect()) }
    }

    /// Number of indices addressable without growing.
    pub fn capacity(&self) -> usize {
        self.words.read().unwrap_or_else(PoisonError::into_inner).len() * WORD_BITS
    }

    pub fn is_excluded(&self, index: usize) -> bool {
        let (word, bit) = split(index);
        let words = self.words.read().unwrap_or_else(PoisonError::into_inner);
        words
            .get(word)
            .is_some_and(|w| w.load(Ordering::Relaxed) & bit != 0)
    }

    pub fn excluded_count(&self) -> usize {
        let words = self.words.read().unwrap_or_else(PoisonError::into_inner);
        words
            .iter()
            .map(|w| w.load(Ordering::Relaxed).count_ones() as usize)
            .sum()
    }
}

impl ExclusionSink for ExclusionBitmap {
    fn mark(&self, index: usize) {
        let (word, bit) = split(index);
        {
            let words = self.words.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(w) = words.get(word) {
                w.fetch_or(bit, Ordering::Relaxed);
                return;
            }
        }
        let mut words = self.words.write().unwrap_or_else(PoisonError::into_inner);
        if words.len() <= word {
            let grow_to = (word + 1).max(words.len() * 2);
            words.resize_with(grow_to, || AtomicU64::new(0));
        }
        words[word].fetch_or(bit, Ordering::Relaxed);
    }
}

#[inline]
fn split(index: usize) -> (usize, u64) {
    (index / WORD_BITS, 1u64 << (index % WORD_BITS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marks_within_capacity() {
        let bm = ExclusionBitmap::with_capacity(10);
        assert_eq!(bm.capacity(), 64);
        bm.mark(3);
        bm.mark(3);
        bm.mark(9);
        assert!(bm.is_excluded(3));
        assert!(!bm.is_excluded(4));
        assert_eq!(bm.excluded_count(), 2);
    }

    #[test]
    fn grows_past_capacity() {
        let bm = ExclusionBitmap::with_capacity(0);
        assert!(!bm.is_excluded(500));
        bm.mark(500);
        assert!(bm.is_excluded(500));
        assert!(bm.capacity() > 500);
        assert_eq!(bm.excluded_count(), 1);
    }
}
