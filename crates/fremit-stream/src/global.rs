//! Process-wide default engine.
//!
//! Engines are single-threaded, so "process-wide" means one default engine
//! per thread, created on first use.

use std::cell::RefCell;

use serde_json::Value;
use tracing::debug;

use crate::engine::Engine;
use crate::stream::Stream;

thread_local! {
    static DEFAULT_ENGINE: RefCell<Option<Engine>> = const { RefCell::new(None) };
}

fn default_engine() -> Engine {
    DEFAULT_ENGINE.with(|slot| slot.borrow_mut().get_or_insert_with(Engine::new).clone())
}

/// Run `f` against the default engine.
pub fn with_default<R>(f: impl FnOnce(&Engine) -> R) -> R {
    f(&default_engine())
}

/// Replace the default engine, returning the previous one if any.
///
/// Streams obtained from [`root`] before the swap keep pointing at the old
/// engine's root.
pub fn install_default(engine: Engine) -> Option<Engine> {
    debug!(engine = %engine.config().name, "Default engine installed");
    DEFAULT_ENGINE.with(|slot| slot.borrow_mut().replace(engine))
}

/// Emit `value` into the default engine.
pub fn emit(value: Value) {
    with_default(|engine| engine.emit(value));
}

/// The default engine's root stream.
#[must_use]
pub fn root() -> Stream {
    with_default(Engine::root)
}

/// Drain the default engine's deferred work. Returns the number of tasks run.
pub fn run_deferred() -> usize {
    with_default(Engine::run_deferred)
}
