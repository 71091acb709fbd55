//! Severity level definitions

use super::error::LoggerError;
use colored::Color;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Message urgency, most urgent first.
///
/// Lower numeric value means higher urgency, so `Severity::Emergency <
/// Severity::Debug`. A sink attached at level `L` admits every message whose
/// severity is `<= L`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
#[repr(u8)]
pub enum Severity {
    Emergency = 0,
    Alert = 1,
    Critical = 2,
    Error = 3,
    Warning = 4,
    Notice = 5,
    Info = 6,
    Debug = 7,
}

impl Severity {
    pub const ALL: [Severity; 8] = [
        Severity::Emergency,
        Severity::Alert,
        Severity::Critical,
        Severity::Error,
        Severity::Warning,
        Severity::Notice,
        Severity::Info,
        Severity::Debug,
    ];

    /// Display name, e.g. `"Warning"`
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Emergency => "Emergency",
            Severity::Alert => "Alert",
            Severity::Critical => "Critical",
            Severity::Error => "Error",
            Severity::Warning => "Warning",
            Severity::Notice => "Notice",
            Severity::Info => "Info",
            Severity::Debug => "Debug",
        }
    }

    #[inline]
    pub fn value(&self) -> u8 {
        *self as u8
    }

    /// Whether a sink configured at `self` should receive a message at `message`.
    #[inline]
    pub fn admits(&self, message: Severity) -> bool {
        self.value() >= message.value()
    }

    /// Parse a name, falling back to `Debug` for anything unrecognized.
    pub fn from_name_lossy(name: &str) -> Self {
        name.parse().unwrap_or(Severity::Debug)
    }

    pub fn color(&self) -> Color {
        match self {
            Severity::Emergency => Color::White,
            Severity::Alert => Color::Cyan,
            Severity::Critical => Color::Magenta,
            Severity::Error => Color::Red,
            Severity::Warning => Color::Yellow,
            Severity::Notice => Color::Green,
            Severity::Info | Severity::Debug => Color::Blue,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "EMERGENCY" => Ok(Severity::Emergency),
            "ALERT" => Ok(Severity::Alert),
            "CRITICAL" => Ok(Severity::Critical),
            "ERROR" => Ok(Severity::Error),
            "WARNING" | "WARN" => Ok(Severity::Warning),
            "NOTICE" => Ok(Severity::Notice),
            "INFO" => Ok(Severity::Info),
            "DEBUG" => Ok(Severity::Debug),
            _ => Err(LoggerError::InvalidSeverityName(s.to_string())),
        }
    }
}

impl TryFrom<i64> for Severity {
    type Error = LoggerError;

    fn try_from(value: i64) -> Result<Self, LoggerError> {
        usize::try_from(value)
            .ok()
            .and_then(|idx| Severity::ALL.get(idx).copied())
            .ok_or(LoggerError::IllegalSeverity(value))
    }
}

impl TryFrom<u8> for Severity {
    type Error = LoggerError;

    fn try_from(value: u8) -> Result<Self, LoggerError> {
        Severity::try_from(i64::from(value))
    }
}

impl TryFrom<String> for Severity {
    type Error = LoggerError;

    fn try_from(value: String) -> Result<Self, LoggerError> {
        value.parse()
    }
}

impl From<Severity> for String {
    fn from(severity: Severity) -> Self {
        severity.as_str().to_lowercase()
    }
}
