//! Pipeline stages.
//!
//! A stage receives a value and a continuation. It decides whether to call
//! the continuation, how many times, and with what value.

use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use tracing::warn;

use crate::path::FieldPath;

/// Predicate used by [`Stage::Filter`].
pub type Predicate = Rc<dyn Fn(&Value) -> bool>;

/// Transform used by [`Stage::Map`].
pub type Transform = Rc<dyn Fn(Value) -> Value>;

/// Side effect used by [`Stage::ForEach`].
pub type Effect = Rc<dyn Fn(&Value)>;

/// Raw stage body used by [`Stage::Custom`].
///
/// The second argument is the continuation. Not calling it stops the value
/// at this stage.
pub type StageFn = Rc<dyn Fn(Value, &dyn Fn(Value))>;

/// One step of a pipeline.
#[derive(Clone)]
pub enum Stage {
    /// Pass the value on only when the predicate holds.
    Filter(Predicate),
    /// Pass on the transformed value.
    Map(Transform),
    /// Observe the value, then pass it on unchanged.
    ForEach(Effect),
    /// Fan an array field out into one value per element.
    Unwind(FieldPath),
    /// Arbitrary stage body.
    Custom {
        /// Label used in logs and introspection.
        name: String,
        /// The stage body.
        run: StageFn,
    },
}

impl Stage {
    /// Build a filter stage.
    pub fn filter<F>(predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + 'static,
    {
        Self::Filter(Rc::new(predicate))
    }

    /// Build a map stage.
    pub fn map<F>(transform: F) -> Self
    where
        F: Fn(Value) -> Value + 'static,
    {
        Self::Map(Rc::new(transform))
    }

    /// Build a side-effect stage.
    pub fn for_each<F>(effect: F) -> Self
    where
        F: Fn(&Value) + 'static,
    {
        Self::ForEach(Rc::new(effect))
    }

    /// Build an unwind stage.
    #[must_use]
    pub fn unwind(path: FieldPath) -> Self {
        Self::Unwind(path)
    }

    /// Build a custom stage from a raw `(value, continuation)` body.
    pub fn custom<F>(name: impl Into<String>, run: F) -> Self
    where
        F: Fn(Value, &dyn Fn(Value)) + 'static,
    {
        Self::Custom {
            name: name.into(),
            run: Rc::new(run),
        }
    }

    /// Short label for this stage.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Filter(_) => "filter",
            Self::Map(_) => "map",
            Self::ForEach(_) => "for_each",
            Self::Unwind(_) => "unwind",
            Self::Custom { name, .. } => name,
        }
    }

    /// Run this stage on `value`, handing results to `next`.
    pub fn run(&self, value: Value, next: &dyn Fn(Value)) {
        match self {
            Self::Filter(predicate) => {
                if predicate(&value) {
                    next(value);
                }
            },
            Self::Map(transform) => next(transform(value)),
            Self::ForEach(effect) => {
                effect(&value);
                next(value);
            },
            Self::Unwind(path) => unwind(path, value, next),
            Self::Custom { run, .. } => run(value, next),
        }
    }
}

fn unwind(path: &FieldPath, value: Value, next: &dyn Fn(Value)) {
    let Some(items) = path.get(&value).and_then(Value::as_array) else {
        warn!(
            component = "unwind",
            path = %path,
            value = %value,
            "Unwind target is not an array, passing value through"
        );
        next(value);
        return;
    };

    for item in items {
        let mut copy = value.clone();
        path.set(&mut copy, item.clone());
        next(copy);
    }
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unwind(path) => f.debug_tuple("Unwind").field(&path.as_str()).finish(),
            other => f.debug_tuple("Stage").field(&other.name()).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fremit_test::{Recorder, WarningCounter, malformed_order, order_with_items};
    use serde_json::json;

    fn run_collect(stage: &Stage, value: Value) -> Vec<Value> {
        let recorder = Recorder::new();
        let sink = recorder.sink();
        stage.run(value, &|v: Value| sink(&v));
        recorder.values()
    }

    #[test]
    fn test_filter_passes_and_blocks() {
        let stage = Stage::filter(|v| v.as_i64().is_some_and(|n| n > 2));
        assert_eq!(run_collect(&stage, json!(3)), vec![json!(3)]);
        assert!(run_collect(&stage, json!(1)).is_empty());
    }

    #[test]
    fn test_map_forwards_transformed() {
        let stage = Stage::map(|v| json!({ "wrapped": v }));
        assert_eq!(run_collect(&stage, json!(1)), vec![json!({"wrapped": 1})]);
    }

    #[test]
    fn test_for_each_observes_and_forwards_original() {
        let seen = Recorder::new();
        let stage = Stage::for_each(seen.sink());
        assert_eq!(run_collect(&stage, json!("a")), vec![json!("a")]);
        assert_eq!(seen.values(), vec![json!("a")]);
    }

    #[test]
    fn test_unwind_one_copy_per_element() {
        let stage = Stage::unwind(FieldPath::parse("items").unwrap());
        let out = run_collect(&stage, order_with_items());
        assert_eq!(
            out,
            vec![
                json!({"items": 1, "tag": "x"}),
                json!({"items": 2, "tag": "x"}),
                json!({"items": 3, "tag": "x"}),
            ]
        );
    }

    #[test]
    fn test_unwind_nested_path_keeps_siblings_independent() {
        let stage = Stage::unwind(FieldPath::parse("order.lines").unwrap());
        let input = json!({"order": {"id": 7, "lines": ["a", "b"]}});
        let out = run_collect(&stage, input.clone());
        assert_eq!(
            out,
            vec![
                json!({"order": {"id": 7, "lines": "a"}}),
                json!({"order": {"id": 7, "lines": "b"}}),
            ]
        );
        assert_eq!(input["order"]["lines"], json!(["a", "b"]));
    }

    #[test]
    fn test_unwind_empty_array_emits_nothing() {
        let stage = Stage::unwind(FieldPath::parse("items").unwrap());
        assert!(run_collect(&stage, json!({"items": []})).is_empty());
    }

    #[test]
    fn test_unwind_non_array_passes_through_with_warning() {
        let warnings = WarningCounter::new();
        let stage = Stage::unwind(FieldPath::parse("items").unwrap());

        let out = warnings.capture(|| run_collect(&stage, malformed_order()));

        assert_eq!(out, vec![malformed_order()]);
        assert_eq!(warnings.count(), 1);
        let fields = &warnings.events()[0];
        assert_eq!(fields.get("component").map(String::as_str), Some("unwind"));
        assert_eq!(fields.get("path").map(String::as_str), Some("items"));
    }

    #[test]
    fn test_unwind_missing_path_passes_through() {
        let warnings = WarningCounter::new();
        let stage = Stage::unwind(FieldPath::parse("items").unwrap());

        let out = warnings.capture(|| run_collect(&stage, json!({"tag": "x"})));

        assert_eq!(out, vec![json!({"tag": "x"})]);
        assert_eq!(warnings.count(), 1);
    }

    #[test]
    fn test_custom_stage_may_call_continuation_twice() {
        let stage = Stage::custom("twice", |v, next| {
            next(v.clone());
            next(v);
        });
        assert_eq!(stage.name(), "twice");
        assert_eq!(run_collect(&stage, json!(1)), vec![json!(1), json!(1)]);
    }

    #[test]
    fn test_debug_shows_name() {
        let stage = Stage::filter(|_| true);
        assert_eq!(format!("{stage:?}"), "Stage(\"filter\")");
        let unwind = Stage::unwind(FieldPath::parse("a.b").unwrap());
        assert_eq!(format!("{unwind:?}"), "Unwind(\"a.b\")");
    }
}
