//! Capture of `WARN` diagnostics emitted through `tracing`.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

/// Fields of one captured warning, rendered as strings.
pub type WarningFields = HashMap<String, String>;

/// A tracing layer that counts warnings and keeps their fields.
///
/// Use [`capture`](WarningCounter::capture) to run code with this layer
/// installed as the thread's default subscriber.
#[derive(Debug, Clone, Default)]
pub struct WarningCounter {
    count: Arc<AtomicUsize>,
    events: Arc<Mutex<Vec<WarningFields>>>,
}

impl WarningCounter {
    /// Create a counter with nothing captured.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` with this counter installed, returning `f`'s result.
    pub fn capture<R>(&self, f: impl FnOnce() -> R) -> R {
        let subscriber = tracing_subscriber::registry().with(self.clone());
        tracing::subscriber::with_default(subscriber, f)
    }

    /// Number of warnings seen.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    /// Fields of every warning seen, in order.
    #[must_use]
    pub fn events(&self) -> Vec<WarningFields> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

struct FieldCollector<'a>(&'a mut WarningFields);

impl Visit for FieldCollector<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.0
            .insert(field.name().to_string(), format!("{value:?}"));
    }
}

impl<S: Subscriber> Layer<S> for WarningCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() != Level::WARN {
            return;
        }
        self.count.fetch_add(1, Ordering::SeqCst);

        let mut fields = WarningFields::new();
        event.record(&mut FieldCollector(&mut fields));
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(fields);
    }
}
