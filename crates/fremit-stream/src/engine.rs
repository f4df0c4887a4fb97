//! The emission engine: root stream, re-entrancy gate and deferred work.

use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use crate::queue::{FlagGuard, TaskQueue};
use crate::stream::Stream;

/// Runtime settings for an [`Engine`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Label attached to the engine's log events.
    #[serde(default = "default_name")]
    pub name: String,
    /// Maximum number of deferred tasks a single drain runs (0 = unlimited).
    #[serde(default)]
    pub drain_limit: usize,
}

fn default_name() -> String {
    "fremit".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            drain_limit: 0,
        }
    }
}

impl EngineConfig {
    /// Create a config with the given engine name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Cap the number of tasks run per drain.
    #[must_use]
    pub fn with_drain_limit(mut self, limit: usize) -> Self {
        self.drain_limit = limit;
        self
    }
}

struct EngineInner {
    root: Stream,
    tasks: TaskQueue,
    emitting: Cell<bool>,
    config: EngineConfig,
}

impl Drop for EngineInner {
    fn drop(&mut self) {
        // Stream handles held elsewhere may keep the queue itself alive.
        let discarded = self.tasks.clear();
        if discarded > 0 {
            debug!(engine = %self.config.name, discarded, "Engine dropped with pending tasks");
        }
    }
}

/// An event source with a single root stream.
///
/// `emit` feeds the root synchronously. An `emit` issued while another is
/// still running (from inside a stage) is queued and runs after the outer
/// emission has finished. Queued work is drained at the end of every
/// outermost `emit` and by [`run_deferred`](Engine::run_deferred).
///
/// Cloning yields another handle to the same engine. Stages that need to
/// emit should capture an [`Emitter`] rather than an `Engine`: an `Engine`
/// captured inside its own pipeline is a reference cycle.
#[derive(Clone)]
pub struct Engine {
    inner: Rc<EngineInner>,
}

impl Engine {
    /// Create an engine with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create an engine with the given settings.
    #[must_use]
    pub fn with_config(config: EngineConfig) -> Self {
        let tasks = TaskQueue::new();
        Self {
            inner: Rc::new(EngineInner {
                root: Stream::new(tasks.clone()),
                tasks,
                emitting: Cell::new(false),
                config,
            }),
        }
    }

    /// The root stream every emitted value enters through.
    #[must_use]
    pub fn root(&self) -> Stream {
        self.inner.root.clone()
    }

    /// Feed `value` into the root stream.
    ///
    /// If a stage panics the panic propagates to the caller; the engine
    /// stays usable afterwards.
    pub fn emit(&self, value: Value) {
        let Some(gate) = FlagGuard::raise(&self.inner.emitting) else {
            trace!(engine = %self.inner.config.name, "Re-entrant emit deferred");
            let emitter = self.emitter();
            self.inner.tasks.defer(move || {
                emitter.emit(value);
            });
            return;
        };

        trace!(engine = %self.inner.config.name, "Emitting value");
        self.inner.root.deliver(value);
        drop(gate);

        self.run_deferred();
    }

    /// A weak handle for emitting from inside stages.
    #[must_use]
    pub fn emitter(&self) -> Emitter {
        Emitter {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Run queued work: buffered replays and deferred emissions.
    ///
    /// Returns the number of tasks run. Honors
    /// [`EngineConfig::drain_limit`]; does nothing when called while a
    /// drain is already running.
    pub fn run_deferred(&self) -> usize {
        self.inner.tasks.drain(self.inner.config.drain_limit)
    }

    /// Number of queued tasks.
    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        self.inner.tasks.len()
    }

    /// Whether an emission is in progress.
    #[must_use]
    pub fn is_emitting(&self) -> bool {
        self.inner.emitting.get()
    }

    /// The engine's settings.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.inner.config)
            .field("emitting", &self.inner.emitting.get())
            .field("tasks", &self.inner.tasks)
            .field("root", &self.inner.root)
            .finish()
    }
}

/// Weak handle to an [`Engine`] that can emit into it.
#[derive(Debug, Clone)]
pub struct Emitter {
    inner: Weak<EngineInner>,
}

impl Emitter {
    /// Emit `value` into the engine.
    ///
    /// Returns `false`, dropping the value, when the engine no longer exists.
    pub fn emit(&self, value: Value) -> bool {
        match self.inner.upgrade() {
            Some(inner) => {
                Engine { inner }.emit(value);
                true
            },
            None => {
                trace!("Emit on a dropped engine ignored");
                false
            },
        }
    }
}
