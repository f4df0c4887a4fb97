//! Fremit Stream - push-based event streams with composable pipelines.
//!
//! This crate provides:
//! - An [`Engine`] owning a root [`Stream`] and a re-entrancy gate
//! - Pipeline operators: `filter`, `map`, `for_each`, `unwind`, `share`
//! - A deferred [`TaskQueue`] for buffered replay and re-entrant emission
//! - A per-thread default engine behind the free [`emit`] function
//!
//! # Architecture
//!
//! Each stream node keeps an ordered list of [`Stage`]s. Whenever a stage is
//! attached the node recomposes its whole list into a single [`Chain`]
//! ending in a fan-out to its children. Emitting a value runs the root chain
//! synchronously; each stage decides whether, and how many times, to pass
//! the value on.
//!
//! Calling [`Stream::share`] freezes a node's own stages: every later
//! attachment forks a new child, so several pipelines can branch from one
//! point.
//!
//! Values delivered to a node before it has any stage are buffered and
//! replayed once, as deferred work, after the next attachment.
//!
//! # Example
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use fremit_stream::Engine;
//! use serde_json::json;
//!
//! let engine = Engine::new();
//! let seen = Rc::new(RefCell::new(Vec::new()));
//!
//! let sink = Rc::clone(&seen);
//! engine
//!     .root()
//!     .filter(|order| order["paid"] == json!(true))
//!     .unwind("items")
//!     .unwrap()
//!     .for_each(move |line| sink.borrow_mut().push(line["items"].clone()));
//!
//! engine.emit(json!({"paid": true, "items": ["tea", "cake"]}));
//! engine.emit(json!({"paid": false, "items": ["coffee"]}));
//!
//! assert_eq!(*seen.borrow(), vec![json!("tea"), json!("cake")]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod chain;
mod engine;
mod error;
mod global;
mod path;
mod queue;
mod stage;
mod stream;

pub use chain::{Chain, compose};
pub use engine::{Emitter, Engine, EngineConfig};
pub use error::{StreamError, StreamResult};
pub use global::{emit, install_default, root, run_deferred, with_default};
pub use path::{FieldPath, Segment};
pub use queue::{Task, TaskQueue};
pub use stage::{Effect, Predicate, Stage, StageFn, Transform};
pub use stream::{Stream, StreamId};
