//! Logger: attached sinks, severity filtering and sync/async delivery

use super::{
    config::{ConsoleConfig, LoggerConfig, SinkConfig, SinkSpec},
    error::{LoggerError, Result},
    in_flight::InFlight,
    message::{CallSite, Message},
    metrics::LoggerMetrics,
    registry::SinkRegistry,
    severity::Severity,
    sink::Sink,
};
use crate::sinks::ConsoleSink;
use crossbeam_channel::{bounded, select, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Default shutdown timeout for logger cleanup (5 seconds)
///
/// Used when the logger is dropped without an explicit [`Logger::shutdown`].
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Queue capacity used by [`Logger::set_async_default`]
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Attachment name of the console sink every logger starts with
pub const DEFAULT_CONSOLE_NAME: &str = "console";

/// Receives sink failures: attachment name and the error
pub type SinkErrorCallback = Arc<dyn Fn(&str, &LoggerError) + Send + Sync>;

type SharedSink = Arc<Mutex<Box<dyn Sink>>>;

#[derive(Clone)]
struct AttachedSink {
    name: Arc<str>,
    level: Severity,
    sink: SharedSink,
}

enum Control {
    Flush(Sender<()>),
}

struct AsyncQueue {
    messages: Sender<Message>,
    control: Sender<Control>,
    capacity: usize,
    worker: Option<JoinHandle<()>>,
}

enum Delivery {
    Sync,
    Async(AsyncQueue),
}

struct State {
    sinks: Vec<AttachedSink>,
    delivery: Delivery,
}

impl State {
    fn contains(&self, name: &str) -> bool {
        self.sinks.iter().any(|attached| &*attached.name == name)
    }
}

/// State shared between the logger handle and its drain worker
struct Shared {
    state: Mutex<State>,
    in_flight: InFlight,
    metrics: LoggerMetrics,
    on_sink_error: SinkErrorCallback,
}

impl Shared {
    /// Sinks admitting `severity`, in attachment order. The state lock is
    /// released before any sink is called.
    fn targets(&self, severity: Severity) -> Vec<AttachedSink> {
        self.state
            .lock()
            .sinks
            .iter()
            .filter(|attached| attached.level.admits(severity))
            .cloned()
            .collect()
    }

    /// Fan a message out to every admitting sink.
    ///
    /// **Per-sink isolation**: a sink that fails or panics is reported and the
    /// remaining sinks still receive the message.
    fn dispatch(&self, message: &Message) {
        for target in self.targets(message.severity) {
            let result = panic::catch_unwind(AssertUnwindSafe(|| target.sink.lock().write(message)));
            if let Some(err) = settle(result) {
                self.metrics.record_write_error();
                (self.on_sink_error)(&target.name, &err);
            }
        }
        self.metrics.record_dispatched();
    }

    fn dispatch_queued(&self, message: Message) {
        self.dispatch(&message);
        self.in_flight.decrement();
    }

    fn flush_sinks(&self) {
        let targets: Vec<AttachedSink> = self.state.lock().sinks.clone();
        for target in targets {
            let result = panic::catch_unwind(AssertUnwindSafe(|| target.sink.lock().flush()));
            if let Some(err) = settle(result) {
                (self.on_sink_error)(&target.name, &err);
            }
        }
        self.metrics.record_flush();
    }
}

fn settle(result: thread::Result<Result<()>>) -> Option<LoggerError> {
    match result {
        Ok(Ok(())) => None,
        Ok(Err(e)) => Some(e),
        Err(payload) => Some(LoggerError::SinkPanicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

fn report_sink_error(name: &str, err: &LoggerError) {
    eprintln!("[LOGGER ERROR] unable to write message to sink '{}': {}", name, err);
}

/// Drain loop of the async worker.
///
/// Messages are dispatched in arrival order. A flush request first dispatches
/// everything still queued, then flushes every sink, then acknowledges. When
/// the logger closes the queue the remainder is dispatched and sinks flushed
/// before the thread exits.
fn drain(shared: Arc<Shared>, messages: Receiver<Message>, control: Receiver<Control>) {
    loop {
        select! {
            recv(messages) -> message => match message {
                Ok(message) => shared.dispatch_queued(message),
                Err(_) => break,
            },
            recv(control) -> signal => match signal {
                Ok(Control::Flush(ack)) => {
                    while let Ok(message) = messages.try_recv() {
                        shared.dispatch_queued(message);
                    }
                    shared.flush_sinks();
                    let _ = ack.send(());
                }
                Err(_) => break,
            },
        }
    }

    while let Ok(message) = messages.try_recv() {
        shared.dispatch_queued(message);
    }
    shared.flush_sinks();
}

/// The logging front-end.
///
/// A new logger delivers synchronously and has one sink attached, a console
/// sink named `"console"` at [`Severity::Debug`].
///
/// # Call sites
///
/// Every message records the caller's file and line. The level methods
/// (`info`, `error`, ...) cannot see the enclosing function, so `%function%`
/// renders empty for them; the macros ([`info!`](crate::info) and friends)
/// fill it in.
///
/// # Example
///
/// ```
/// use sink_logger::prelude::*;
///
/// let logger = Logger::new();
/// logger.detach("console");
/// logger
///     .attach("stdout", Severity::Info, ConsoleConfig::new().with_format("[%level_string%] %body%"))
///     .unwrap();
///
/// logger.info("service started");
/// logger.debug("not shown: below the sink's level");
/// logger.flush().unwrap();
/// ```
pub struct Logger {
    shared: Arc<Shared>,
    registry: Arc<SinkRegistry>,
}

impl Logger {
    /// Create a logger backed by the process-wide [`SinkRegistry`]
    #[must_use]
    pub fn new() -> Self {
        Self::with_registry(SinkRegistry::global())
    }

    /// Create a logger that resolves sink types through `registry`
    #[must_use]
    pub fn with_registry(registry: Arc<SinkRegistry>) -> Self {
        Self::with_parts(registry, Arc::new(report_sink_error))
    }

    fn with_parts(registry: Arc<SinkRegistry>, on_sink_error: SinkErrorCallback) -> Self {
        let logger = Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    sinks: Vec::new(),
                    delivery: Delivery::Sync,
                }),
                in_flight: InFlight::new(),
                metrics: LoggerMetrics::new(),
                on_sink_error,
            }),
            registry,
        };
        logger.attach_default_console();
        logger
    }

    fn attach_default_console(&self) {
        let mut console = ConsoleSink::new();
        let result = console
            .init(&SinkConfig::Console(ConsoleConfig::default()))
            .and_then(|()| self.attach_sink(DEFAULT_CONSOLE_NAME, Severity::Debug, Box::new(console)));
        if let Err(e) = result {
            eprintln!("[LOGGER ERROR] Failed to attach default console sink: {}", e);
        }
    }

    /// Create a builder for Logger
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    /// Build a logger from a [`LoggerConfig`] using the process-wide registry
    pub fn from_config(config: &LoggerConfig) -> Result<Self> {
        Self::builder().config(config.clone()).build()
    }

    /// Attach a sink built from the registry constructor for `config`'s type.
    ///
    /// Fails with [`LoggerError::DuplicateName`] if `name` is taken,
    /// [`LoggerError::UnknownSinkType`] if the type is not registered, or
    /// [`LoggerError::SinkInit`] if the sink rejects its config. The sink list
    /// is unchanged on failure.
    pub fn attach(&self, name: &str, level: Severity, config: impl Into<SinkConfig>) -> Result<()> {
        let config = config.into();
        let mut state = self.shared.state.lock();

        if state.contains(name) {
            return Err(LoggerError::DuplicateName(name.to_string()));
        }

        let constructor = self.registry.lookup(config.kind())?;
        let mut sink = constructor();
        sink.init(&config)
            .map_err(|e| LoggerError::sink_init(name, e))?;

        state.sinks.push(AttachedSink {
            name: Arc::from(name),
            level,
            sink: Arc::new(Mutex::new(sink)),
        });
        Ok(())
    }

    /// Attach an already initialized sink instance, bypassing the registry
    pub fn attach_sink(&self, name: &str, level: Severity, sink: Box<dyn Sink>) -> Result<()> {
        let mut state = self.shared.state.lock();

        if state.contains(name) {
            return Err(LoggerError::DuplicateName(name.to_string()));
        }

        state.sinks.push(AttachedSink {
            name: Arc::from(name),
            level,
            sink: Arc::new(Mutex::new(sink)),
        });
        Ok(())
    }

    /// Remove every sink attached as `name`. Returns whether one was found;
    /// detaching an unknown name is not an error.
    ///
    /// The sink is not flushed first. It is dropped once no in-progress
    /// fan-out still holds it.
    pub fn detach(&self, name: &str) -> bool {
        let removed: Vec<AttachedSink> = {
            let mut state = self.shared.state.lock();
            let (removed, kept) = std::mem::take(&mut state.sinks)
                .into_iter()
                .partition(|attached| &*attached.name == name);
            state.sinks = kept;
            removed
        };
        !removed.is_empty()
    }

    /// Names of the attached sinks in attachment (fan-out) order
    pub fn sink_names(&self) -> Vec<String> {
        self.shared
            .state
            .lock()
            .sinks
            .iter()
            .map(|attached| attached.name.to_string())
            .collect()
    }

    /// Whether a sink is attached as `name`
    pub fn is_attached(&self, name: &str) -> bool {
        self.shared.state.lock().contains(name)
    }

    /// Switch to async delivery with a queue of `capacity` messages and start
    /// the drain worker.
    ///
    /// There is no way back to sync delivery short of [`shutdown`](Self::shutdown);
    /// a second call fails with [`LoggerError::AsyncAlreadyEnabled`].
    pub fn set_async(&self, capacity: usize) -> Result<()> {
        let mut state = self.shared.state.lock();
        if matches!(state.delivery, Delivery::Async(_)) {
            return Err(LoggerError::AsyncAlreadyEnabled);
        }

        let (messages_tx, messages_rx) = bounded(capacity);
        let (control_tx, control_rx) = bounded(1);
        let shared = Arc::clone(&self.shared);

        let worker = thread::Builder::new()
            .name("sink-logger-drain".to_string())
            .spawn(move || drain(shared, messages_rx, control_rx))
            .map_err(|e| {
                LoggerError::io_operation("starting drain worker", "Failed to spawn thread", e)
            })?;

        state.delivery = Delivery::Async(AsyncQueue {
            messages: messages_tx,
            control: control_tx,
            capacity,
            worker: Some(worker),
        });
        Ok(())
    }

    /// [`set_async`](Self::set_async) with [`DEFAULT_QUEUE_CAPACITY`]
    pub fn set_async_default(&self) -> Result<()> {
        self.set_async(DEFAULT_QUEUE_CAPACITY)
    }

    /// Whether messages go through the queue and drain worker
    pub fn is_async(&self) -> bool {
        matches!(self.shared.state.lock().delivery, Delivery::Async(_))
    }

    /// Queue capacity when async
    pub fn queue_capacity(&self) -> Option<usize> {
        match &self.shared.state.lock().delivery {
            Delivery::Sync => None,
            Delivery::Async(queue) => Some(queue.capacity),
        }
    }

    /// Messages accepted but not yet dispatched to every sink
    pub fn in_flight(&self) -> usize {
        self.shared.in_flight.current()
    }

    /// Log `body` at `severity`, recording the caller's location.
    ///
    /// Sync: every admitting sink has been written before this returns.
    /// Async: the message is queued, blocking while the queue is full.
    /// Sink write failures are never returned here; they go to the sink
    /// error callback.
    #[track_caller]
    pub fn log(&self, severity: Severity, body: impl Into<String>) -> Result<()> {
        self.log_at(severity, body, CallSite::caller())
    }

    /// Log with a numeric level. Values outside `0..=7` are rejected with
    /// [`LoggerError::IllegalSeverity`] and nothing is delivered.
    #[track_caller]
    pub fn log_raw(&self, level: i64, body: impl Into<String>) -> Result<()> {
        let site = CallSite::caller();
        let severity = Severity::try_from(level).inspect_err(|_| {
            self.shared.metrics.record_rejected();
        })?;
        self.log_at(severity, body, site)
    }

    /// Log with an explicit call site
    pub fn log_at(&self, severity: Severity, body: impl Into<String>, site: CallSite) -> Result<()> {
        self.deliver(Message::new(severity, body, site))
    }

    #[doc(hidden)]
    pub fn emit_at(&self, severity: Severity, body: impl Into<String>, site: CallSite) {
        if let Err(e) = self.log_at(severity, body, site) {
            eprintln!("[LOGGER ERROR] Failed to deliver {} message: {}", severity, e);
        }
    }

    fn deliver(&self, message: Message) -> Result<()> {
        // Counted under the state lock, so a shutdown that swaps the delivery
        // mode sees every message already headed for the queue.
        let queue = match &self.shared.state.lock().delivery {
            Delivery::Sync => None,
            Delivery::Async(queue) => {
                self.shared.in_flight.increment();
                Some(queue.messages.clone())
            }
        };

        let Some(sender) = queue else {
            // A worker left running by a timed-out shutdown still owns older
            // messages; sync writes must not overtake them.
            self.shared.in_flight.wait_idle();
            self.shared.dispatch(&message);
            return Ok(());
        };

        let result = match sender.try_send(message) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(message)) => {
                // Backpressure: wait for the worker to make room
                self.shared.metrics.record_queue_full();
                sender.send(message).map_err(|_| LoggerError::LoggerStopped)
            }
            Err(TrySendError::Disconnected(_)) => Err(LoggerError::LoggerStopped),
        };

        if result.is_err() {
            self.shared.in_flight.decrement();
            self.shared.metrics.record_rejected();
        }
        result
    }

    /// Write out everything logged so far and flush every sink.
    ///
    /// Sync: flushes each sink in attachment order. Async: asks the worker to
    /// dispatch the queued messages and flush, then waits until the in-flight
    /// count is zero. There is no timeout.
    pub fn flush(&self) -> Result<()> {
        let control = match &self.shared.state.lock().delivery {
            Delivery::Sync => None,
            Delivery::Async(queue) => Some(queue.control.clone()),
        };

        let Some(control) = control else {
            self.shared.in_flight.wait_idle();
            self.shared.flush_sinks();
            return Ok(());
        };

        let (ack_tx, ack_rx) = bounded(1);
        control
            .send(Control::Flush(ack_tx))
            .map_err(|_| LoggerError::LoggerStopped)?;
        ack_rx.recv().map_err(|_| LoggerError::LoggerStopped)?;
        self.shared.in_flight.wait_idle();
        Ok(())
    }

    /// Get the logger metrics for detailed observability
    pub fn metrics(&self) -> &LoggerMetrics {
        &self.shared.metrics
    }

    /// Stop the drain worker, waiting at most `timeout` for it to dispatch what
    /// is queued and flush the sinks. In sync mode this only flushes.
    ///
    /// Afterwards the logger keeps working with sync delivery. If the worker
    /// is still draining when `timeout` expires, later sync writes wait for it
    /// so they never overtake queued messages.
    ///
    /// # Returns
    ///
    /// `true` if shutdown completed within `timeout`
    pub fn shutdown(&self, timeout: Duration) -> bool {
        let previous = std::mem::replace(&mut self.shared.state.lock().delivery, Delivery::Sync);

        let mut queue = match previous {
            Delivery::Sync => {
                self.shared.flush_sinks();
                return true;
            }
            Delivery::Async(queue) => queue,
        };

        // Closing both channels tells the worker to finish
        let worker = queue.worker.take();
        drop(queue);

        let Some(handle) = worker else {
            return true;
        };

        let start = Instant::now();
        loop {
            if handle.is_finished() {
                if let Err(e) = handle.join() {
                    eprintln!(
                        "[LOGGER ERROR] Drain worker panicked during shutdown: {}",
                        panic_message(e.as_ref())
                    );
                    return false;
                }
                return true;
            }

            if start.elapsed() >= timeout {
                eprintln!(
                    "[LOGGER WARNING] Drain worker did not finish within {:?}. \
                     It keeps draining; sync writes wait for it.",
                    timeout
                );
                return false;
            }

            thread::sleep(Duration::from_millis(10));
        }
    }

    /// Log at [`Severity::Emergency`]. Delivery failures are reported on
    /// stderr. The call site has no function name; use [`emergency!`](crate::emergency)
    /// to record it.
    #[track_caller]
    pub fn emergency(&self, body: impl Into<String>) {
        self.emit_at(Severity::Emergency, body, CallSite::caller());
    }

    #[track_caller]
    pub fn alert(&self, body: impl Into<String>) {
        self.emit_at(Severity::Alert, body, CallSite::caller());
    }

    #[track_caller]
    pub fn critical(&self, body: impl Into<String>) {
        self.emit_at(Severity::Critical, body, CallSite::caller());
    }

    #[track_caller]
    pub fn error(&self, body: impl Into<String>) {
        self.emit_at(Severity::Error, body, CallSite::caller());
    }

    #[track_caller]
    pub fn warning(&self, body: impl Into<String>) {
        self.emit_at(Severity::Warning, body, CallSite::caller());
    }

    #[track_caller]
    pub fn notice(&self, body: impl Into<String>) {
        self.emit_at(Severity::Notice, body, CallSite::caller());
    }

    #[track_caller]
    pub fn info(&self, body: impl Into<String>) {
        self.emit_at(Severity::Info, body, CallSite::caller());
    }

    #[track_caller]
    pub fn debug(&self, body: impl Into<String>) {
        self.emit_at(Severity::Debug, body, CallSite::caller());
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("sinks", &self.sink_names())
            .field("queue_capacity", &self.queue_capacity())
            .finish()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.shutdown(DEFAULT_SHUTDOWN_TIMEOUT);

        let errors = self.shared.metrics.write_errors();
        if errors > 0 {
            eprintln!(
                "[LOGGER WARNING] Logger shutting down after {} failed sink writes (error rate: {:.2}%)",
                errors,
                self.shared.metrics.error_rate()
            );
        }
    }
}

/// Builder for constructing Logger with a fluent API
///
/// # Example
/// ```
/// use sink_logger::prelude::*;
///
/// let logger = Logger::builder()
///     .without_default_console()
///     .sink("stdout", Severity::Notice, ConsoleConfig::new().with_color(true))
///     .async_mode(1000)
///     .build()
///     .unwrap();
/// assert!(logger.is_async());
/// ```
pub struct LoggerBuilder {
    registry: Option<Arc<SinkRegistry>>,
    sinks: Vec<SinkSpec>,
    async_capacity: Option<usize>,
    keep_default_console: bool,
    on_sink_error: Option<SinkErrorCallback>,
}

impl LoggerBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            registry: None,
            sinks: Vec::new(),
            async_capacity: None,
            keep_default_console: true,
            on_sink_error: None,
        }
    }

    /// Resolve sink types through `registry` instead of the global one
    #[must_use = "builder methods return a new value"]
    pub fn registry(mut self, registry: Arc<SinkRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Attach a sink at build time
    #[must_use = "builder methods return a new value"]
    pub fn sink(mut self, name: impl Into<String>, level: Severity, config: impl Into<SinkConfig>) -> Self {
        self.sinks.push(SinkSpec {
            name: name.into(),
            level,
            config: config.into(),
        });
        self
    }

    /// Enable async mode with the given queue capacity
    ///
    /// If not called, the logger will use synchronous mode.
    #[must_use = "builder methods return a new value"]
    pub fn async_mode(mut self, capacity: usize) -> Self {
        self.async_capacity = Some(capacity);
        self
    }

    /// Detach the default console sink before attaching the configured sinks
    #[must_use = "builder methods return a new value"]
    pub fn without_default_console(mut self) -> Self {
        self.keep_default_console = false;
        self
    }

    /// Route sink write and flush failures to `callback` instead of stderr
    #[must_use = "builder methods return a new value"]
    pub fn on_sink_error(mut self, callback: SinkErrorCallback) -> Self {
        self.on_sink_error = Some(callback);
        self
    }

    /// Apply a [`LoggerConfig`]; its sinks are added after any already given
    #[must_use = "builder methods return a new value"]
    pub fn config(mut self, config: LoggerConfig) -> Self {
        self.keep_default_console &= config.keep_default_console;
        if config.async_capacity.is_some() {
            self.async_capacity = config.async_capacity;
        }
        self.sinks.extend(config.sinks);
        self
    }

    /// Build the Logger, attaching every configured sink in order
    pub fn build(self) -> Result<Logger> {
        let registry = self.registry.unwrap_or_else(SinkRegistry::global);
        let on_sink_error: SinkErrorCallback = match self.on_sink_error {
            Some(callback) => callback,
            None => Arc::new(report_sink_error),
        };
        let logger = Logger::with_parts(registry, on_sink_error);

        if !self.keep_default_console {
            logger.detach(DEFAULT_CONSOLE_NAME);
        }
        for spec in self.sinks {
            logger.attach(&spec.name, spec.level, spec.config)?;
        }
        if let Some(capacity) = self.async_capacity {
            logger.set_async(capacity)?;
        }

        Ok(logger)
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
