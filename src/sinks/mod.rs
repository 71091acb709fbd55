//! Built-in sink implementations

#[cfg(feature = "api")]
pub mod api;
pub mod console;
pub mod file;

#[cfg(feature = "api")]
pub use api::ApiSink;
pub use console::ConsoleSink;
pub use file::FileSink;
