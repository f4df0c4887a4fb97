//! JSON fixtures shared by tests.

use serde_json::{Value, json};

/// An event with an array field: `{"items": [1, 2, 3], "tag": "x"}`.
#[must_use]
pub fn order_with_items() -> Value {
    json!({"items": [1, 2, 3], "tag": "x"})
}

/// An event whose `items` field is not an array.
#[must_use]
pub fn malformed_order() -> Value {
    json!({"items": "not-an-array"})
}

/// A nested event: an order holding line items under `order.lines`.
#[must_use]
pub fn nested_order(id: u64, lines: &[&str]) -> Value {
    json!({"order": {"id": id, "lines": lines}})
}

/// A numbered event, `{"n": n}`.
#[must_use]
pub fn numbered(n: i64) -> Value {
    json!({ "n": n })
}

/// `numbered` events for every value in `range`.
#[must_use]
pub fn numbered_events(range: std::ops::Range<i64>) -> Vec<Value> {
    range.map(numbered).collect()
}
