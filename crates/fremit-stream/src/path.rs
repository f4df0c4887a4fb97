//! Field paths for addressing data inside a JSON value.
//!
//! A path is a dot-separated list of object keys, each optionally followed
//! by one or more bracketed array indices: `order.items`, `rows[0].tags`,
//! `matrix[1][2]`.
//!
//! A dotted key made only of digits (`rows.0`) also addresses an array
//! element when the value it lands on is an array. Where nothing exists
//! yet, [`FieldPath::set`] creates an object for such a key.

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::error::{StreamError, StreamResult};

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Object member lookup.
    Key(String),
    /// Array element lookup.
    Index(usize),
}

/// A parsed path expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    raw: String,
    segments: Vec<Segment>,
}

impl FieldPath {
    /// Parse a path expression.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::InvalidPath`] for an empty path, an empty
    /// segment (`a..b`, trailing `.`), an unterminated or stray bracket, or
    /// an index that is not a non-negative integer.
    pub fn parse(raw: &str) -> StreamResult<Self> {
        let mut segments = Vec::new();
        let mut key = String::new();
        let mut after_index = false;
        let mut chars = raw.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '.' => {
                    if key.is_empty() && !after_index {
                        return Err(StreamError::invalid_path(raw, "empty segment"));
                    }
                    if !key.is_empty() {
                        segments.push(Segment::Key(std::mem::take(&mut key)));
                    }
                    if chars.peek().is_none() {
                        return Err(StreamError::invalid_path(raw, "trailing '.'"));
                    }
                    after_index = false;
                },
                '[' => {
                    if !key.is_empty() {
                        segments.push(Segment::Key(std::mem::take(&mut key)));
                    }
                    let mut digits = String::new();
                    loop {
                        match chars.next() {
                            Some(']') => break,
                            Some(d) => digits.push(d),
                            None => {
                                return Err(StreamError::invalid_path(raw, "unterminated '['"));
                            },
                        }
                    }
                    let index = digits.trim().parse::<usize>().map_err(|_| {
                        StreamError::invalid_path(
                            raw,
                            format!("index '{digits}' is not a non-negative integer"),
                        )
                    })?;
                    segments.push(Segment::Index(index));
                    after_index = true;
                },
                ']' => return Err(StreamError::invalid_path(raw, "unexpected ']'")),
                other => {
                    if after_index {
                        return Err(StreamError::invalid_path(
                            raw,
                            "expected '.' or '[' after ']'",
                        ));
                    }
                    key.push(other);
                },
            }
        }

        if !key.is_empty() {
            segments.push(Segment::Key(key));
        }
        if segments.is_empty() {
            return Err(StreamError::invalid_path(raw, "path is empty"));
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// The path as it was written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The parsed segments.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Look up the value at this path.
    ///
    /// Returns `None` when any step is missing, out of range, or lands on
    /// something that is not a container of the right kind.
    #[must_use]
    pub fn get<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        self.segments
            .iter()
            .try_fold(value, |current, segment| match segment {
                Segment::Key(key) => match current {
                    Value::Array(items) => items.get(array_index(key)?),
                    other => other.as_object()?.get(key),
                },
                Segment::Index(index) => current.as_array()?.get(*index),
            })
    }

    /// Write `new_value` at this path, creating containers along the way.
    ///
    /// Missing or wrongly-shaped intermediate values are replaced by an
    /// object (for key segments) or an array (for index segments). Arrays
    /// are padded with `null` up to the requested index.
    pub fn set(&self, target: &mut Value, new_value: Value) {
        let slot = self
            .segments
            .iter()
            .fold(target, |slot, segment| child_mut(slot, segment));
        *slot = new_value;
    }
}

/// A canonical non-negative integer key (`0`, `17`, never `01` or `+1`).
fn array_index(key: &str) -> Option<usize> {
    let canonical = key.bytes().all(|b| b.is_ascii_digit()) && (key == "0" || !key.starts_with('0'));
    if canonical { key.parse().ok() } else { None }
}

fn child_mut<'a>(slot: &'a mut Value, segment: &Segment) -> &'a mut Value {
    match segment {
        Segment::Key(key) => {
            if slot.is_array()
                && let Some(index) = array_index(key)
            {
                return element_mut(slot, index);
            }
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            &mut slot[key.as_str()]
        },
        Segment::Index(index) => {
            if !slot.is_array() {
                *slot = Value::Array(Vec::new());
            }
            element_mut(slot, *index)
        },
    }
}

fn element_mut(slot: &mut Value, index: usize) -> &mut Value {
    if let Value::Array(items) = slot
        && items.len() <= index
    {
        items.resize(index.saturating_add(1), Value::Null);
    }
    &mut slot[index]
}

impl FromStr for FieldPath {
    type Err = StreamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for FieldPath {
    type Error = StreamError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
