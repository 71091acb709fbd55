//! Sink type registry
//!
//! Maps a sink type name (`"console"`, `"file"`, ...) to a constructor so the
//! logger can build sinks from a [`SinkConfig`](super::SinkConfig) without
//! knowing the concrete types. Each name is registered once; lookups are
//! read-mostly.

use super::config::{CONSOLE_SINK, FILE_SINK};
use super::error::{LoggerError, Result};
use super::sink::Sink;
use crate::sinks::{ConsoleSink, FileSink};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Builds a fresh, uninitialized sink
pub type SinkConstructor = Arc<dyn Fn() -> Box<dyn Sink> + Send + Sync>;

static GLOBAL: Lazy<Arc<SinkRegistry>> = Lazy::new(|| Arc::new(SinkRegistry::with_builtins()));

pub struct SinkRegistry {
    constructors: RwLock<HashMap<String, SinkConstructor>>,
}

impl SinkRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self {
            constructors: RwLock::new(HashMap::new()),
        }
    }

    /// A registry holding the sinks shipped with this crate
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register(CONSOLE_SINK, || Box::new(ConsoleSink::new()));
        registry.register(FILE_SINK, || Box::new(FileSink::new()));
        #[cfg(feature = "api")]
        registry.register(super::config::API_SINK, || {
            Box::new(crate::sinks::ApiSink::new())
        });
        registry
    }

    /// The process-wide registry used by [`Logger::new`](crate::Logger::new)
    pub fn global() -> Arc<SinkRegistry> {
        Arc::clone(&GLOBAL)
    }

    /// Register a sink type.
    ///
    /// # Panics
    ///
    /// Panics if `type_name` is empty or already registered. Registration is
    /// startup wiring; use [`try_register`](Self::try_register) when the
    /// type set is only known at runtime.
    pub fn register<F>(&self, type_name: &str, constructor: F)
    where
        F: Fn() -> Box<dyn Sink> + Send + Sync + 'static,
    {
        if let Err(e) = self.try_register(type_name, constructor) {
            panic!("logger: {}", e);
        }
    }

    pub fn try_register<F>(&self, type_name: &str, constructor: F) -> Result<()>
    where
        F: Fn() -> Box<dyn Sink> + Send + Sync + 'static,
    {
        if type_name.is_empty() {
            return Err(LoggerError::InvalidRegistration(
                "sink type name is empty".to_string(),
            ));
        }

        let mut constructors = self.constructors.write();
        if constructors.contains_key(type_name) {
            return Err(LoggerError::DuplicateRegistration(type_name.to_string()));
        }
        constructors.insert(type_name.to_string(), Arc::new(constructor));
        Ok(())
    }

    pub fn lookup(&self, type_name: &str) -> Result<SinkConstructor> {
        self.constructors
            .read()
            .get(type_name)
            .cloned()
            .ok_or_else(|| LoggerError::UnknownSinkType(type_name.to_string()))
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.constructors.read().contains_key(type_name)
    }

    /// Registered type names, sorted
    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.constructors.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for SinkRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for SinkRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkRegistry")
            .field("types", &self.type_names())
            .finish()
    }
}
