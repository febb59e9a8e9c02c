//! # Observability
//!
//! Structured logging via the `tracing` ecosystem. Every processing stage
//! emits `tracing` events (`debug!` for stage numbers, `info!` for outcomes,
//! `warn!` for QC failures and fallbacks); an application installs a
//! subscriber once with [`init_logging`].
//!
//! ```rust,ignore
//! use smp_core::observe::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::production());
//! tracing::info!(channel = "HNE", "V2 processing started");
//! ```

pub mod logging;

pub use logging::{init_logging, LogConfig, LogFormat, LogLevel};
