//! Recording sink for pipeline outputs.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;

/// Collects every value it is handed, in order.
///
/// Clones share the same storage, so a clone can be moved into a stage
/// while the test keeps the original for assertions.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    values: Rc<RefCell<Vec<Value>>>,
}

impl Recorder {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one value.
    pub fn record(&self, value: &Value) {
        self.values.borrow_mut().push(value.clone());
    }

    /// A closure suitable for `for_each` that records into this recorder.
    #[must_use]
    pub fn sink(&self) -> impl Fn(&Value) + Clone + 'static {
        let recorder = self.clone();
        move |value: &Value| recorder.record(value)
    }

    /// Snapshot of everything recorded so far.
    #[must_use]
    pub fn values(&self) -> Vec<Value> {
        self.values.borrow().clone()
    }

    /// Number of recorded values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.borrow().len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.borrow().is_empty()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.values.borrow_mut().clear();
    }
}
