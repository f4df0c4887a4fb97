//! Fremit Test - Shared test utilities for the fremit stream engine.
//!
//! This crate provides recording sinks, a tracing layer that captures
//! warnings, and JSON fixtures. It is meant to be used as a
//! dev-dependency.
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! fremit-test.workspace = true
//! ```
//!
//! ```rust,ignore
//! use fremit_test::{Recorder, order_with_items};
//!
//! let out = Recorder::new();
//! engine.root().unwind("items")?.for_each(out.sink());
//! engine.emit(order_with_items());
//! assert_eq!(out.len(), 3);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod fixtures;
pub mod recorder;
pub mod warnings;

pub use fixtures::*;
pub use recorder::Recorder;
pub use warnings::WarningCounter;
