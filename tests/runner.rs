use anyhow::Result;
use lazybeam::testing::*;
use lazybeam::{
    Concurrency, DEFAULT_CONCURRENCY, EvalConfig, EvalError, MAX_CONCURRENCY, Strategy, from_fn,
    from_vec,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[test]
fn concurrency_defaults_and_bounds() {
    let p = from_vec(vec![1]);
    assert_eq!(p.concurrency().get(), DEFAULT_CONCURRENCY);
    assert_eq!(p.clone().parallel(0).concurrency().get(), DEFAULT_CONCURRENCY);
    assert_eq!(p.clone().parallel(1).concurrency().get(), 1);
    assert_eq!(p.clone().parallel(100_000).concurrency().get(), MAX_CONCURRENCY);
    assert_eq!(p.parallel(3).parallel(0).concurrency().get(), 3);
}

#[test]
fn output_is_invariant_under_width() {
    let p = from_fn(|i| (i % 7 != 3).then_some(i as u64 * 31 % 101))
        .generate(500)
        .map(|x| x * 2)
        .filter(|x| x % 3 != 0);
    assert_width_invariant(&p, &[1, 2, 3, 4, 8, 16, 64, 256]);
}

#[test]
fn order_follows_source_not_completion() {
    // early indices sleep longest, so they finish last
    let p = from_vec((0..16u64).collect::<Vec<_>>())
        .map(|x| {
            thread::sleep(Duration::from_millis(16 - x));
            x
        })
        .parallel(8);
    assert_collections_equal(&p.collect(), &(0..16).collect::<Vec<_>>());
}

#[test]
fn workers_never_exceed_width() {
    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));
    let (a, pk) = (Arc::clone(&active), Arc::clone(&peak));
    let p = from_fn(move |i| {
        let now = a.fetch_add(1, Ordering::SeqCst) + 1;
        pk.fetch_max(now, Ordering::SeqCst);
        thread::sleep(Duration::from_millis(2));
        a.fetch_sub(1, Ordering::SeqCst);
        Some(i)
    })
    .generate(64)
    .parallel(3);

    assert_eq!(p.count(), 64);
    assert!(peak.load(Ordering::SeqCst) <= 3, "peak was {}", peak.load(Ordering::SeqCst));
}

#[test]
fn each_index_probed_exactly_once_in_parallel() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let s = Arc::clone(&seen);
    let p = from_fn(Some)
        .inspect(move |i, _| s.lock().unwrap().push(i))
        .generate(200)
        .parallel(16);
    assert_eq!(p.collect().len(), 200);

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 200);
    let unique: HashSet<_> = seen.iter().copied().collect();
    assert_eq!(unique.len(), 200);
}

#[test]
fn filter_marks_exclusions() {
    let p = from_vec((0..10).collect::<Vec<i32>>()).filter(|x| x % 3 == 0);
    assert_collections_equal(&p.collect(), &[0, 3, 6, 9]);
    let ex = p.exclusions();
    assert_eq!(ex.excluded_count(), 6);
    assert!(ex.is_excluded(1));
    assert!(!ex.is_excluded(3));
}

#[test]
fn exclusions_are_shared_across_branches_and_runs() {
    let base = from_vec((0..8).collect::<Vec<i32>>());
    let evens = base.filter(|x| x % 2 == 0);
    let small = base.filter(|x| *x < 6);

    assert_collections_equal(&evens.collect(), &[0, 2, 4, 6]);
    assert_eq!(small.exclusions().excluded_count(), 4);

    assert_collections_equal(&small.collect(), &[0, 1, 2, 3, 4, 5]);
    // 6 and 7 from `small`, on top of the odd indices from `evens`
    assert_eq!(evens.exclusions().excluded_count(), 5);
    assert!(base.exclusions().is_excluded(6));

    small.collect();
    assert_eq!(base.exclusions().excluded_count(), 5);
}

#[test]
fn many_widths_give_the_same_result() {
    let expected: Vec<usize> = (0..40).filter(|i| i % 3 != 0).collect();
    for w in 1..=64 {
        let p = from_fn(|i| (i % 3 != 0).then_some(i)).generate(40).parallel(w);
        assert_collections_equal(&p.collect(), &expected);
    }
}

#[test]
fn stats_describe_the_run() -> Result<()> {
    let p = from_vec(vec![1, 2, 3, 4, 5]).filter(|x: &i32| x % 2 == 1).parallel(2);
    let (out, stats) = p.collect_with_stats();
    assert_collections_equal(&out, &[1, 3, 5]);
    assert_eq!(stats.strategy, Strategy::Parallel { domain: 5 });
    assert_eq!((stats.probed, stats.kept, stats.skipped), (5, 3, 2));
    assert_eq!(stats.concurrency, 2);

    let json = stats.to_json()?;
    assert_eq!(json["kept"], 3);
    assert!(json.get("elapsed_ms").is_some());

    let (_, stats) = from_fn(|i| (i % 2 == 0).then_some(i)).take(3).collect_with_stats();
    assert_eq!(stats.strategy, Strategy::Sequential { limit: 3 });
    assert_eq!((stats.probed, stats.kept, stats.skipped), (5, 3, 2));
    assert_eq!(stats.concurrency, 1);

    let (out, stats) = from_fn(Some::<usize>).collect_with_stats();
    assert!(out.is_empty());
    assert_eq!(stats.strategy, Strategy::Empty);
    Ok(())
}

#[test]
fn checked_evaluation() -> Result<()> {
    let err = from_fn(Some::<usize>).try_collect().unwrap_err();
    assert_eq!(err.downcast_ref::<EvalError>(), Some(&EvalError::Unconfigured));
    assert!(from_fn(Some::<usize>).try_count().is_err());

    assert_eq!(from_fn(Some).take(4).try_collect()?, vec![0, 1, 2, 3]);
    assert_eq!(from_fn(Some).take(4).try_count()?, 4);
    assert_eq!(from_vec(vec![1, 2]).try_count()?, 2);
    Ok(())
}

#[test]
fn config_applies_concurrency() -> Result<()> {
    let cfg = EvalConfig::from_json_str(r#"{ "concurrency": 12 }"#)?;
    let p = from_vec(vec![3, 2, 1]).with_config(cfg);
    assert_eq!(p.concurrency(), Concurrency::new(12).unwrap());
    assert_collections_equal(&p.collect(), &[3, 2, 1]);

    let back = EvalConfig::from_json_str(&cfg.to_json_string()?)?;
    assert_eq!(back, cfg);
    Ok(())
}

#[test]
fn available_concurrency_is_in_range() {
    let c = Concurrency::available().get();
    assert!((1..=MAX_CONCURRENCY).contains(&c));
}
