//! Sink trait for log output destinations

use super::{config::SinkConfig, error::Result, message::Message};

/// A pluggable output the logger fans messages out to.
///
/// The logger calls `init` exactly once before the first `write`, then
/// `write` for every admitted message and `flush` on every logger flush.
/// Calls on one instance are serialized by the logger; the instance is
/// dropped on detach or logger shutdown, which is where resources close.
pub trait Sink: Send {
    /// Registry type name, e.g. `"console"`
    fn name(&self) -> &str;

    fn init(&mut self, config: &SinkConfig) -> Result<()>;

    fn write(&mut self, message: &Message) -> Result<()>;

    fn flush(&mut self) -> Result<()>;
}
