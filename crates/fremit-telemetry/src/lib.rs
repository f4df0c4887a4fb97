//! Fremit Telemetry - Logging setup for the fremit stream engine.
//!
//! This crate provides:
//! - A serializable [`LogConfig`] with builder methods
//! - Pretty, compact, JSON and full output formats
//! - Stdout, stderr or daily-rotated file targets
//!
//! # Example
//!
//! ```rust,no_run
//! use fremit_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), fremit_telemetry::TelemetryError> {
//! let config = LogConfig::new("debug")
//!     .with_format(LogFormat::Compact)
//!     .with_directive("fremit_stream=trace");
//!
//! setup_logging(&config)?;
//! tracing::info!("Logging ready");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{LogConfig, LogFormat, LogTarget, setup_default_logging, setup_logging};
