//! Log message record

use super::severity::Severity;
use chrono::{DateTime, Local};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::panic::Location;
use std::path::Path;

const SECOND_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const MILLISECOND_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Where a log call originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite {
    pub file: &'static str,
    pub line: u32,
    pub function: Option<&'static str>,
}

impl CallSite {
    /// Location of the nearest caller outside a `#[track_caller]` chain.
    #[track_caller]
    pub fn caller() -> Self {
        let location = Location::caller();
        Self {
            file: location.file(),
            line: location.line(),
            function: None,
        }
    }

    pub fn new(file: &'static str, line: u32, function: &'static str) -> Self {
        Self {
            file,
            line,
            function: Some(function),
        }
    }
}

/// One log event, built once per log call and shared read-only by every sink.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    #[serde(skip)]
    pub datetime: DateTime<Local>,
    pub timestamp: i64,
    pub timestamp_format: String,
    pub millisecond: i64,
    pub millisecond_format: String,
    #[serde(rename = "level", serialize_with = "serialize_level_value")]
    pub severity: Severity,
    pub level_string: &'static str,
    pub body: String,
    pub file: String,
    pub line: u32,
    pub function: String,
}

fn serialize_level_value<S: Serializer>(severity: &Severity, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u8(severity.value())
}

impl Message {
    pub fn new(severity: Severity, body: impl Into<String>, site: CallSite) -> Self {
        Self::at(Local::now(), severity, body, site)
    }

    /// Build a message with an explicit wall-clock time
    pub fn at(
        datetime: DateTime<Local>,
        severity: Severity,
        body: impl Into<String>,
        site: CallSite,
    ) -> Self {
        let file = Path::new(site.file)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(site.file);

        Self {
            timestamp: datetime.timestamp(),
            timestamp_format: datetime.format(SECOND_FORMAT).to_string(),
            millisecond: datetime.timestamp_millis(),
            millisecond_format: datetime.format(MILLISECOND_FORMAT).to_string(),
            datetime,
            severity,
            level_string: severity.as_str(),
            body: body.into(),
            file: file.to_string(),
            line: site.line,
            function: site.function.unwrap_or_default().to_string(),
        }
    }

    /// Every field rendered as text, keyed by its external name
    pub fn to_fields(&self) -> BTreeMap<&'static str, String> {
        BTreeMap::from([
            ("timestamp", self.timestamp.to_string()),
            ("timestamp_format", self.timestamp_format.clone()),
            ("millisecond", self.millisecond.to_string()),
            ("millisecond_format", self.millisecond_format.clone()),
            ("level", self.severity.value().to_string()),
            ("level_string", self.level_string.to_string()),
            ("body", self.body.clone()),
            ("file", self.file.clone()),
            ("line", self.line.to_string()),
            ("function", self.function.clone()),
        ])
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
