//! Sink and logger configuration
//!
//! A [`SinkConfig`] is a tagged variant: its tag is the registry type name the
//! logger looks up when attaching, and its payload is handed to the new sink's
//! `init`. Everything here (de)serializes with serde so whole logger setups can
//! be loaded from JSON.

use super::error::{LoggerError, Result};
use super::severity::Severity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const CONSOLE_SINK: &str = "console";
pub const FILE_SINK: &str = "file";
pub const API_SINK: &str = "api";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SinkConfig {
    Console(ConsoleConfig),
    File(FileConfig),
    Api(ApiConfig),
    Custom(CustomConfig),
}

impl SinkConfig {
    /// Registry key of the sink type this config selects
    pub fn kind(&self) -> &str {
        match self {
            SinkConfig::Console(_) => CONSOLE_SINK,
            SinkConfig::File(_) => FILE_SINK,
            SinkConfig::Api(_) => API_SINK,
            SinkConfig::Custom(custom) => &custom.kind,
        }
    }
}

impl From<ConsoleConfig> for SinkConfig {
    fn from(config: ConsoleConfig) -> Self {
        SinkConfig::Console(config)
    }
}

impl From<FileConfig> for SinkConfig {
    fn from(config: FileConfig) -> Self {
        SinkConfig::File(config)
    }
}

impl From<ApiConfig> for SinkConfig {
    fn from(config: ApiConfig) -> Self {
        SinkConfig::Api(config)
    }
}

impl From<CustomConfig> for SinkConfig {
    fn from(config: CustomConfig) -> Self {
        SinkConfig::Custom(config)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Colorize each line by severity
    pub color: bool,
    pub json_format: bool,
    /// Message template, used when `json_format` is off. Empty means the default.
    pub format: String,
}

impl ConsoleConfig {
    /// Uncolored text output with the default template
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Colorize each line by severity
    #[must_use]
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Emit one JSON object per line instead of the template
    #[must_use]
    pub fn with_json_format(mut self, json_format: bool) -> Self {
        self.json_format = json_format;
        self
    }

    /// Message template used for text output
    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }
}

/// Period after which a file is renamed aside and restarted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateSlice {
    #[default]
    #[serde(alias = "")]
    None,
    #[serde(alias = "y")]
    Year,
    #[serde(alias = "m")]
    Month,
    #[serde(alias = "d")]
    Day,
    #[serde(alias = "h")]
    Hour,
}

impl DateSlice {
    /// chrono format of the period key, also used as the rotated file suffix
    pub fn period_format(&self) -> Option<&'static str> {
        match self {
            DateSlice::None => None,
            DateSlice::Year => Some("%Y"),
            DateSlice::Month => Some("%Y%m"),
            DateSlice::Day => Some("%Y%m%d"),
            DateSlice::Hour => Some("%Y%m%d%H"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// File receiving every admitted message
    pub filename: Option<PathBuf>,
    /// Extra files receiving only messages of exactly that severity
    pub level_filenames: BTreeMap<Severity, PathBuf>,
    /// Rotate once the file reaches this many bytes (0 disables)
    pub max_size: u64,
    /// Rotate once the file reaches this many lines (0 disables)
    pub max_lines: u64,
    pub date_slice: DateSlice,
    pub json_format: bool,
    pub format: String,
    /// Gzip rotated files
    pub compress: bool,
}

impl FileConfig {
    #[must_use]
    pub fn new(filename: impl Into<PathBuf>) -> Self {
        Self {
            filename: Some(filename.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_level_file(mut self, severity: Severity, path: impl Into<PathBuf>) -> Self {
        self.level_filenames.insert(severity, path.into());
        self
    }

    #[must_use]
    pub fn with_max_size(mut self, bytes: u64) -> Self {
        self.max_size = bytes;
        self
    }

    #[must_use]
    pub fn with_max_lines(mut self, lines: u64) -> Self {
        self.max_lines = lines;
        self
    }

    #[must_use]
    pub fn with_date_slice(mut self, slice: DateSlice) -> Self {
        self.date_slice = slice;
        self
    }

    #[must_use]
    pub fn with_json_format(mut self, json_format: bool) -> Self {
        self.json_format = json_format;
        self
    }

    #[must_use]
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    #[must_use]
    pub fn with_compression(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub url: String,
    pub method: HttpMethod,
    pub headers: BTreeMap<String, String>,
    /// Treat any status other than `verify_code` as a write error
    pub verify: bool,
    pub verify_code: u16,
    /// Request timeout; `None` uses the sink's default
    pub timeout_ms: Option<u64>,
}

impl ApiConfig {
    #[must_use]
    pub fn new(url: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            url: url.into(),
            method,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_verify(mut self, code: u16) -> Self {
        self.verify = true;
        self.verify_code = code;
        self
    }

    #[must_use]
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }
}

/// Config for sink types registered outside this crate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomConfig {
    pub kind: String,
    #[serde(default)]
    pub settings: serde_json::Value,
}

impl CustomConfig {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            settings: serde_json::Value::Null,
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: serde_json::Value) -> Self {
        self.settings = settings;
        self
    }
}

fn default_level() -> Severity {
    Severity::Debug
}

/// One sink to attach: name, minimum severity, config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinkSpec {
    pub name: String,
    #[serde(default = "default_level")]
    pub level: Severity,
    pub config: SinkConfig,
}

/// Whole-logger setup, applied by [`Logger::from_config`](crate::Logger::from_config)
///
/// ```
/// use sink_logger::core::LoggerConfig;
///
/// let config = LoggerConfig::from_json_str(r#"{
///     "async_capacity": 256,
///     "sinks": [
///         { "name": "errors", "level": "error",
///           "config": { "type": "file", "filename": "/tmp/errors.log" } }
///     ]
/// }"#).unwrap();
/// assert_eq!(config.sinks.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Switch to async delivery with this queue capacity
    pub async_capacity: Option<usize>,
    /// Keep the console sink every logger starts with
    pub keep_default_console: bool,
    pub sinks: Vec<SinkSpec>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            async_capacity: None,
            keep_default_console: true,
            sinks: Vec::new(),
        }
    }
}

impl LoggerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            LoggerError::io_operation(
                "reading logger config",
                format!("Failed to read '{}'", path.display()),
                e,
            )
        })?;
        Self::from_json_str(&json)
    }
}
