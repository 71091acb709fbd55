//! # Sink Logger
//!
//! A leveled logging library that fans each message out to pluggable sinks.
//!
//! ## Features
//!
//! - **Eight severities**: Emergency (most severe) through Debug
//! - **Pluggable sinks**: console, file and HTTP API built in; custom sink
//!   types are added through a [`SinkRegistry`]
//! - **Per-sink filtering**: every sink has its own minimum severity
//! - **Sync or async delivery**: async mode queues messages for a background
//!   worker, and [`Logger::flush`] waits until everything queued is written
//!
//! ```
//! use sink_logger::prelude::*;
//! use sink_logger::info;
//!
//! let logger = Logger::new();
//! info!(logger, "listening on port {}", 8080);
//! logger.flush().unwrap();
//! ```

pub mod core;
pub mod macros;
pub mod sinks;

pub mod prelude {
    pub use crate::core::{
        ApiConfig, CallSite, ConsoleConfig, CustomConfig, DateSlice, FileConfig, HttpMethod,
        Logger, LoggerBuilder, LoggerConfig, LoggerError, LoggerMetrics, Message, Result,
        Severity, Sink, SinkConfig, SinkRegistry, DEFAULT_SHUTDOWN_TIMEOUT,
    };
    pub use crate::sinks::{ConsoleSink, FileSink};
}

pub use core::{
    ApiConfig, CallSite, ConsoleConfig, CustomConfig, DateSlice, FileConfig, HttpMethod, Logger,
    LoggerBuilder, LoggerConfig, LoggerError, LoggerMetrics, Message, MessageFormat,
    OutputFormat, Result, Severity, Sink, SinkConfig, SinkErrorCallback, SinkRegistry,
    SinkSpec, DEFAULT_SHUTDOWN_TIMEOUT,
};
#[cfg(feature = "api")]
pub use sinks::ApiSink;
pub use sinks::{ConsoleSink, FileSink};
