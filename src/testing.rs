//! Testing helpers for pipelines.
//!
//! - [`assert_collections_equal`]: exact, order-dependent comparison
//! - [`assert_all`]: every element matches a predicate
//! - [`assert_width_invariant`]: a pipeline yields the same output at every
//!   worker width

use crate::pipeline::Pipeline;
use crate::stage::Element;
use std::fmt::Debug;

/// Assert that two collections are equal in order and content.
///
/// # Panics
///
/// Panics if the collections differ in length or content.
///
/// ```
/// use lazybeam::from_vec;
/// use lazybeam::testing::assert_collections_equal;
///
/// let odds = from_vec(vec![1, 2, 3, 4, 5]).filter(|x: &i32| x % 2 == 1);
/// assert_collections_equal(&odds.collect(), &[1, 3, 5]);
/// ```
pub fn assert_collections_equal<T: Debug + PartialEq>(actual: &[T], expected: &[T]) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "Collection length mismatch:\n  Expected length: {}\n  Actual length: {}\n  Expected: {expected:?}\n  Actual: {actual:?}",
        expected.len(),
        actual.len()
    );

    for (i, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        assert_eq!(
            a, e,
            "Collection mismatch at index {i}:\n  Expected: {e:?}\n  Actual: {a:?}\n  Full expected: {expected:?}\n  Full actual: {actual:?}"
        );
    }
}

/// Assert that every element satisfies `pred`.
///
/// # Panics
///
/// Panics on the first element that does not.
pub fn assert_all<T: Debug, F: Fn(&T) -> bool>(actual: &[T], pred: F) {
    if let Some((i, bad)) = actual.iter().enumerate().find(|(_, x)| !pred(x)) {
        panic!("Predicate failed at index {i}: {bad:?}\n  Full actual: {actual:?}");
    }
}

/// Assert that `pipeline` collects and counts the same at every width in `widths`.
///
/// # Panics
///
/// Panics if any width disagrees with the first one.
pub fn assert_width_invariant<T>(pipeline: &Pipeline<T>, widths: &[usize])
where
    T: Element + Debug + PartialEq,
{
    let Some((&first, rest)) = widths.split_first() else {
        return;
    };
    let base = pipeline.clone().parallel(first);
    let expected = base.collect();
    let expected_count = base.count();
    assert_eq!(expected.len(), expected_count, "count disagrees with collect at width {first}");

    for &w in rest {
        let p = pipeline.clone().parallel(w);
        let actual = p.collect();
        assert_eq!(
            actual, expected,
            "Output at width {w} differs from width {first}:\n  Expected: {expected:?}\n  Actual: {actual:?}"
        );
        assert_eq!(p.count(), expected_count, "count at width {w} differs from width {first}");
    }
}
