//! Prelude module - commonly used types for convenient import.
//!
//! Use `use fremit_stream::prelude::*;` to import all essential types.
//!
//! # Example
//!
//! ```rust
//! use fremit_stream::prelude::*;
//! use serde_json::json;
//!
//! let engine = Engine::new();
//! engine.root().map(|v| json!({"wrapped": v}));
//! engine.emit(json!(1));
//! ```

// Engine
pub use crate::{Emitter, Engine, EngineConfig};

// Streams and stages
pub use crate::{FieldPath, Stage, Stream};

// Errors
pub use crate::{StreamError, StreamResult};

// Default engine
pub use crate::{emit, root, run_deferred};
