//! End-to-end behavior of pipelines built on an engine.

use std::cell::RefCell;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

use fremit_stream::{Engine, EngineConfig, Stage, emit, install_default, root, run_deferred};
use fremit_test::{
    Recorder, WarningCounter, malformed_order, nested_order, numbered, numbered_events,
    order_with_items,
};
use serde_json::{Value, json};

fn n(value: &Value) -> i64 {
    value["n"].as_i64().unwrap_or_default()
}

#[test]
fn test_values_emitted_before_consumers_are_replayed_once() {
    install_default(Engine::new());
    for event in numbered_events(0..3) {
        emit(event);
    }
    assert_eq!(root().buffered_len(), 3);

    let out = Recorder::new();
    root().for_each(out.sink());
    assert!(out.is_empty());

    run_deferred();
    assert_eq!(out.values(), numbered_events(0..3));

    root().for_each(|_| {});
    run_deferred();
    assert_eq!(out.len(), 3);
}

#[test]
fn test_filter_then_for_each() {
    let engine = Engine::new();
    let out = Recorder::new();
    engine
        .root()
        .filter(|v| n(v) % 2 == 0)
        .for_each(out.sink());

    for event in numbered_events(0..6) {
        engine.emit(event);
    }

    assert_eq!(out.values(), vec![numbered(0), numbered(2), numbered(4)]);
}

#[test]
fn test_map_then_for_each_sees_only_transformed() {
    let engine = Engine::new();
    let out = Recorder::new();
    engine
        .root()
        .map(|v| numbered(n(&v).saturating_mul(100)))
        .for_each(out.sink());

    engine.emit(numbered(1));
    engine.emit(numbered(2));

    assert_eq!(out.values(), vec![numbered(100), numbered(200)]);
}

#[test]
fn test_share_forks_independent_children() {
    let engine = Engine::new();
    let first = Recorder::new();
    let second = Recorder::new();

    let shared = engine.root().share();
    let a = shared.for_each(first.sink());
    let b = shared.for_each(second.sink());

    assert_eq!(engine.root().child_count(), 2);
    assert!(!a.ptr_eq(&b));

    engine.emit(json!("once"));

    assert_eq!(first.values(), vec![json!("once")]);
    assert_eq!(second.values(), vec![json!("once")]);
}

#[test]
fn test_forked_branches_transform_independently() {
    let engine = Engine::new();
    let evens = Recorder::new();
    let doubled = Recorder::new();

    let base = engine.root().filter(|v| n(v) >= 0).share();
    base.filter(|v| n(v) % 2 == 0).for_each(evens.sink());
    base.map(|v| numbered(n(&v).saturating_mul(2)))
        .for_each(doubled.sink());

    for event in numbered_events(0..4) {
        engine.emit(event);
    }
    engine.emit(numbered(-1));

    assert_eq!(evens.values(), vec![numbered(0), numbered(2)]);
    assert_eq!(
        doubled.values(),
        vec![numbered(0), numbered(2), numbered(4), numbered(6)]
    );
    assert_eq!(engine.root().stage_names(), vec!["filter"]);
}

#[test]
fn test_unwind_array_field() {
    let engine = Engine::new();
    let out = Recorder::new();
    engine.root().unwind("items").unwrap().for_each(out.sink());

    engine.emit(order_with_items());

    assert_eq!(
        out.values(),
        vec![
            json!({"items": 1, "tag": "x"}),
            json!({"items": 2, "tag": "x"}),
            json!({"items": 3, "tag": "x"}),
        ]
    );
}

#[test]
fn test_unwind_nested_field() {
    let engine = Engine::new();
    let out = Recorder::new();
    engine
        .root()
        .unwind("order.lines")
        .unwrap()
        .for_each(out.sink());

    engine.emit(nested_order(9, &["tea", "cake"]));

    assert_eq!(
        out.values(),
        vec![
            json!({"order": {"id": 9, "lines": "tea"}}),
            json!({"order": {"id": 9, "lines": "cake"}}),
        ]
    );
}

#[test]
fn test_unwind_non_array_passes_through_with_one_warning() {
    let engine = Engine::new();
    let out = Recorder::new();
    engine.root().unwind("items").unwrap().for_each(out.sink());
    let warnings = WarningCounter::new();

    warnings.capture(|| engine.emit(malformed_order()));

    assert_eq!(out.values(), vec![malformed_order()]);
    assert_eq!(warnings.count(), 1);
}

#[test]
fn test_reentrant_emit_delivered_after_outer_completes() {
    let engine = Engine::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    let shared = engine.root().share();

    let emitter = engine.emitter();
    let first = Rc::clone(&log);
    shared.for_each(move |v| {
        first.borrow_mut().push(("first", v.clone()));
        if n(v) == 1 {
            emitter.emit(numbered(2));
        }
    });
    let second = Rc::clone(&log);
    shared.for_each(move |v| second.borrow_mut().push(("second", v.clone())));

    engine.emit(numbered(1));

    assert_eq!(
        *log.borrow(),
        vec![
            ("first", numbered(1)),
            ("second", numbered(1)),
            ("first", numbered(2)),
            ("second", numbered(2)),
        ]
    );
}

#[test]
fn test_attach_never_reruns_delivered_values() {
    let engine = Engine::new();
    let early = Recorder::new();
    engine.root().for_each(early.sink());
    engine.emit(numbered(1));

    let late = Recorder::new();
    engine.root().for_each(late.sink());
    engine.run_deferred();
    assert!(late.is_empty());

    engine.emit(numbered(2));
    assert_eq!(early.values(), vec![numbered(1), numbered(2)]);
    assert_eq!(late.values(), vec![numbered(2)]);
}

#[test]
fn test_engine_survives_panicking_stage() {
    let engine = Engine::new();
    let out = Recorder::new();
    engine
        .root()
        .map(|v| {
            assert!(n(&v) >= 0, "negative input");
            v
        })
        .for_each(out.sink());

    let result = catch_unwind(AssertUnwindSafe(|| engine.emit(numbered(-5))));
    assert!(result.is_err());
    assert!(!engine.is_emitting());

    engine.emit(numbered(5));
    assert_eq!(out.values(), vec![numbered(5)]);
}

#[test]
fn test_custom_stage_through_attach() {
    let engine = Engine::new();
    let out = Recorder::new();
    engine
        .root()
        .attach(Stage::custom("pairs", |v, next| {
            next(v.clone());
            next(json!([v, "again"]));
        }))
        .for_each(out.sink());

    engine.emit(json!(1));

    assert_eq!(out.values(), vec![json!(1), json!([1, "again"])]);
}

#[test]
fn test_drain_limit_spreads_deferred_work() {
    let engine = Engine::with_config(EngineConfig::new("limited").with_drain_limit(2));
    let out = Recorder::new();
    let emitter = engine.emitter();
    let sink = out.sink();
    engine.root().for_each(move |v| {
        sink(v);
        if n(v) == 0 {
            for i in 1..=4 {
                emitter.emit(numbered(i));
            }
        }
    });

    engine.emit(numbered(0));
    assert_eq!(out.len(), 3);
    assert_eq!(engine.pending_tasks(), 2);

    engine.run_deferred();
    assert_eq!(out.values(), numbered_events(0..5));
}
