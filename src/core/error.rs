//! Error types for the logger system

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Numeric severity outside the eight defined levels
    #[error("Severity {0} is illegal")]
    IllegalSeverity(i64),

    /// Severity name that does not match any level
    #[error("Invalid severity name: '{0}'")]
    InvalidSeverityName(String),

    /// A sink with this name is already attached
    #[error("Sink '{0}' is already attached")]
    DuplicateName(String),

    /// No constructor registered for the sink type
    #[error("Unknown sink type '{0}'")]
    UnknownSinkType(String),

    /// Sink initialization failed during attach
    #[error("Sink '{name}' init failed: {source}")]
    SinkInit {
        name: String,
        #[source]
        source: Box<LoggerError>,
    },

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// `set_async` called on a logger that already has a drain worker
    #[error("Async delivery is already enabled")]
    AsyncAlreadyEnabled,

    /// Drain worker is gone
    #[error("Logger already stopped")]
    LoggerStopped,

    /// Sink panicked inside write or flush
    #[error("Sink panicked: {0}")]
    SinkPanicked(String),

    /// Sink type registered twice
    #[error("Sink type '{0}' is already registered")]
    DuplicateRegistration(String),

    /// Registration without a usable type name
    #[error("Invalid sink registration: {0}")]
    InvalidRegistration(String),

    /// File sink error with path
    #[error("File sink error for '{path}': {message}")]
    FileSinkError { path: String, message: String },

    /// File rotation error
    #[error("File rotation failed for '{path}': {message}")]
    FileRotationError { path: String, message: String },

    /// HTTP transport error
    #[cfg(feature = "api")]
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Remote endpoint answered with an unexpected status
    #[error("Request to {url} failed, code={code}")]
    ApiStatus { url: String, code: u16 },

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Wrap a sink init failure with the attachment name
    pub fn sink_init(name: impl Into<String>, source: LoggerError) -> Self {
        LoggerError::SinkInit {
            name: name.into(),
            source: Box::new(source),
        }
    }

    /// Create a file sink error
    pub fn file_sink(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileSinkError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a file rotation error
    pub fn file_rotation(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileRotationError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }

    /// Static-wiring mistakes that terminate the process when hit through
    /// [`SinkRegistry::register`](crate::core::SinkRegistry::register).
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            LoggerError::DuplicateRegistration(_) | LoggerError::InvalidRegistration(_)
        )
    }
}
