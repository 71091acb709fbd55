//! Core logger types and traits

pub mod config;
pub mod error;
pub mod format;
pub mod in_flight;
pub mod logger;
pub mod message;
pub mod metrics;
pub mod registry;
pub mod severity;
pub mod sink;

pub use config::{
    ApiConfig, ConsoleConfig, CustomConfig, DateSlice, FileConfig, HttpMethod, LoggerConfig,
    SinkConfig, SinkSpec, API_SINK, CONSOLE_SINK, FILE_SINK,
};
pub use error::{LoggerError, Result};
pub use format::{MessageFormat, OutputFormat, Token, DEFAULT_TEMPLATE};
pub use in_flight::InFlight;
pub use logger::{
    Logger, LoggerBuilder, SinkErrorCallback, DEFAULT_CONSOLE_NAME, DEFAULT_QUEUE_CAPACITY,
    DEFAULT_SHUTDOWN_TIMEOUT,
};
pub use message::{CallSite, Message};
pub use metrics::LoggerMetrics;
pub use registry::{SinkConstructor, SinkRegistry};
pub use severity::Severity;
pub use sink::Sink;
