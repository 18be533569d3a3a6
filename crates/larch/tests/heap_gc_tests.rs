//! Heap and collector behavior observable through the embedding API and the
//! `gc` / `core::heap-view` primitives.

use larch::{CountingTracer, Env};
use pretty_assertions::assert_eq;

#[test]
fn gc_primitive_reports_bytes_reclaimed() {
    let mut env = Env::new();
    let value = env.eval_str("(gc :nil)").unwrap();
    assert!(value.is_fixnum());
    assert!(value.as_fixnum() >= 0);
}

#[test]
fn gc_rejects_non_boolean_arguments() {
    let mut env = Env::new();
    match env.eval_str("(gc 7)") {
        Err(larch::EnvError::Condition(exception)) => assert_eq!(exception.class, ":type"),
        other => panic!("expected a type condition, got {other:?}"),
    }
}

#[test]
fn collection_is_idempotent() {
    let mut env = Env::new();
    // Allocate garbage unreachable afterwards.
    env.eval_str("(cons 1 (cons 2 (cons 3 ())))").unwrap();
    let first = env.gc_now();
    assert!(first > 0, "dead conses should reclaim bytes");
    let second = env.gc_now();
    assert_eq!(second, 0, "a second pass reclaims nothing new");
}

#[test]
fn bound_values_survive_collection() {
    let mut env = Env::new();
    env.eval_str("(:defsym keep '(1 2 3))").unwrap();
    env.gc_now();
    let value = env.eval_str("keep").unwrap();
    assert_eq!(env.print_to_string(value, true), "(1 2 3)");
}

#[test]
fn free_pairs_are_reused() {
    let mut env = Env::new();
    env.eval_str("(cons 1 2)").unwrap();
    env.gc_now();
    let stats_before = env.heap_stats();
    assert!(stats_before.free_slots > 0);

    // New conses refill freed slots instead of growing the arena.
    env.eval_str("(cons 3 4)").unwrap();
    let stats_after = env.heap_stats();
    assert_eq!(stats_after.total_slots, stats_before.total_slots);
}

#[test]
fn heap_view_summarizes_classes() {
    let mut env = Env::new();
    let summary = env.eval_str("(core::heap-view :t)").unwrap();
    let printed = env.print_to_string(summary, true);
    assert!(printed.starts_with("#(:t "), "got {printed}");

    let conses = env.eval_str("(core::heap-view :cons)").unwrap();
    let printed = env.print_to_string(conses, true);
    assert!(printed.starts_with("#(:t -1 "), "got {printed}");

    // Immediates have no heap accounting.
    let none = env.eval_str("(core::heap-view :fixnum)").unwrap();
    assert_eq!(env.print_to_string(none, true), ":nil");
}

#[test]
fn heap_view_free_counts_track_collections() {
    let mut env = Env::new();
    env.eval_str("(cons 1 (cons 2 (cons 3 (cons 4 (cons 5 (cons 6 ()))))))").unwrap();
    env.eval_str("(gc :nil)").unwrap();
    let frees = env.eval_str("(vector-ref (core::heap-view :cons) 3)").unwrap();
    assert!(frees.as_fixnum() > 0, "freed conses should be counted");
}

#[test]
fn heap_stats_reflect_live_objects() {
    let mut env = Env::new();
    let stats = env.heap_stats();
    assert!(stats.live_objects > 0);
    assert!(stats.objects_by_class.contains_key("func"));
    assert!(stats.objects_by_class.contains_key("symbol"));
    assert_eq!(stats.total_slots, stats.live_objects + stats.free_slots);
}

#[test]
fn shared_structure_collects_once() {
    let mut env = Env::new();
    // A diamond: both slots of the outer pair reference the same cell.
    env.eval_str("((:lambda (cell) (cons cell cell)) (cons 1 2))").unwrap();
    env.gc_now();
    let reclaimed = env.gc_now();
    assert_eq!(reclaimed, 0);
}

#[test]
fn tracer_sees_collections_and_conditions() {
    let mut env = Env::new();
    env.set_tracer(Box::new(CountingTracer::default()));
    env.gc_now();
    let _ = env.eval_str("(fixnum+ :bad 1)");
    // The tracer is write-only from here; swapping it back out is enough to
    // show the hooks fired without a panic.
    env.set_tracer(Box::new(larch::NoopTracer));
}
