//! Logging macros for ergonomic log message formatting.
//!
//! These macros format their arguments like `format!` and record the file,
//! line and enclosing function of the call.
//!
//! # Examples
//!
//! ```
//! use sink_logger::prelude::*;
//! use sink_logger::{info, warning};
//!
//! let logger = Logger::new();
//!
//! // Basic logging
//! info!(logger, "Server started");
//!
//! // With format arguments
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//!
//! let used = 91;
//! warning!(logger, "Disk usage at {}%", used);
//! ```

/// Path of the enclosing function, e.g. `my_app::server::run`.
///
/// Closures report the function they are defined in.
#[macro_export]
macro_rules! function_name {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        let name = name.strip_suffix("::f").unwrap_or(name);
        name.trim_end_matches("::{{closure}}")
    }};
}

/// Log a message with automatic formatting.
///
/// # Examples
///
/// ```
/// # use sink_logger::prelude::*;
/// # let logger = Logger::new();
/// use sink_logger::log;
/// log!(logger, Severity::Info, "Simple message");
/// log!(logger, Severity::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.emit_at(
            $level,
            format!($($arg)+),
            $crate::CallSite::new(file!(), line!(), $crate::function_name!()),
        )
    };
}

/// Log an emergency-level message.
///
/// # Examples
///
/// ```
/// # use sink_logger::prelude::*;
/// # let logger = Logger::new();
/// use sink_logger::emergency;
/// emergency!(logger, "Data directory {} is gone", "/var/lib/app");
/// ```
#[macro_export]
macro_rules! emergency {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Severity::Emergency, $($arg)+)
    };
}

/// Log an alert-level message.
#[macro_export]
macro_rules! alert {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Severity::Alert, $($arg)+)
    };
}

/// Log a critical-level message.
#[macro_export]
macro_rules! critical {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Severity::Critical, $($arg)+)
    };
}

/// Log an error-level message.
///
/// # Examples
///
/// ```
/// # use sink_logger::prelude::*;
/// # let logger = Logger::new();
/// use sink_logger::error;
/// error!(logger, "Failed to connect to database");
/// error!(logger, "Error code: {}, message: {}", 500, "Internal error");
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Severity::Error, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warning {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Severity::Warning, $($arg)+)
    };
}

/// Log a notice-level message.
#[macro_export]
macro_rules! notice {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Severity::Notice, $($arg)+)
    };
}

/// Log an info-level message.
///
/// # Examples
///
/// ```
/// # use sink_logger::prelude::*;
/// # let logger = Logger::new();
/// use sink_logger::info;
/// info!(logger, "Application started");
/// info!(logger, "Processing {} items", 100);
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Severity::Info, $($arg)+)
    };
}

/// Log a debug-level message.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Severity::Debug, $($arg)+)
    };
}

#[cfg(test)]
mod tests {
    use crate::core::{Logger, Message, Result, Severity, Sink, SinkConfig};
    use parking_lot::Mutex;
    use std::sync::Arc;

    struct CaptureSink(Arc<Mutex<Vec<Message>>>);

    impl Sink for CaptureSink {
        fn name(&self) -> &str {
            "capture"
        }

        fn init(&mut self, _config: &SinkConfig) -> Result<()> {
            Ok(())
        }

        fn write(&mut self, message: &Message) -> Result<()> {
            self.0.lock().push(message.clone());
            Ok(())
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }
    }

    fn capturing_logger() -> (Logger, Arc<Mutex<Vec<Message>>>) {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let logger = Logger::new();
        logger.detach("console");
        logger
            .attach_sink("capture", Severity::Debug, Box::new(CaptureSink(Arc::clone(&captured))))
            .unwrap();
        (logger, captured)
    }

    #[test]
    fn test_function_name() {
        assert_eq!(
            function_name!(),
            "sink_logger::macros::tests::test_function_name"
        );

        let from_closure = || function_name!();
        assert_eq!(
            from_closure(),
            "sink_logger::macros::tests::test_function_name"
        );
    }

    #[test]
    fn test_log_macro_records_call_site() {
        let (logger, captured) = capturing_logger();
        let expected_line = line!() + 1;
        log!(logger, Severity::Notice, "Formatted: {}", 42);

        let messages = captured.lock();
        assert_eq!(messages.len(), 1);
        let message = &messages[0];
        assert_eq!(message.body, "Formatted: 42");
        assert_eq!(message.severity, Severity::Notice);
        assert_eq!(message.file, "macros.rs");
        assert_eq!(message.line, expected_line);
        assert!(message.function.ends_with("test_log_macro_records_call_site"));
    }

    #[test]
    fn test_level_macros() {
        let (logger, captured) = capturing_logger();
        emergency!(logger, "e");
        alert!(logger, "a");
        critical!(logger, "c");
        error!(logger, "Code: {}", 500);
        warning!(logger, "w");
        notice!(logger, "n");
        info!(logger, "Items: {}", 100);
        debug!(logger, "d");

        let severities: Vec<Severity> = captured.lock().iter().map(|m| m.severity).collect();
        assert_eq!(severities, Severity::ALL.to_vec());
        assert_eq!(captured.lock()[3].body, "Code: 500");
    }
}
