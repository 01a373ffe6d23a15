//! Operator configuration inputs
//!
//! Typed views of the parts of the Authentication operator resource and the
//! cluster Proxy status that Deployment synthesis consumes.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{yaml, Error, Result};

/// Requested operand log level
///
/// Parsed leniently: an empty string means the default level and values the
/// operator does not know are kept verbatim in `Unknown`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LogLevel {
    /// Default verbosity
    #[default]
    Normal,
    /// Debug-level logging
    Debug,
    /// Trace-level logging
    Trace,
    /// Log everything
    TraceAll,
    /// A level this operator does not recognize
    Unknown(String),
}

impl LogLevel {
    /// Map a requested level to the operand's numeric verbosity.
    ///
    /// An unset level uses the default. `TraceAll` maps to 100 so that it
    /// means every log line rather than the next tier up.
    pub fn verbosity(level: Option<&LogLevel>) -> u32 {
        match level.map(LogLevel::normalized) {
            None | Some(LogLevel::Normal) => 2,
            Some(LogLevel::Debug) => 4,
            Some(LogLevel::Trace) => 6,
            Some(LogLevel::TraceAll) => 100,
            Some(LogLevel::Unknown(_)) => 0,
        }
    }

    /// Re-parse the level so an `Unknown` holding an empty or known name
    /// compares as that level.
    pub fn normalized(&self) -> LogLevel {
        LogLevel::from(self.as_str())
    }

    /// String form as it appears in the operator resource
    pub fn as_str(&self) -> &str {
        match self {
            LogLevel::Normal => "Normal",
            LogLevel::Debug => "Debug",
            LogLevel::Trace => "Trace",
            LogLevel::TraceAll => "TraceAll",
            LogLevel::Unknown(s) => s,
        }
    }
}

impl From<&str> for LogLevel {
    fn from(s: &str) -> Self {
        match s {
            "" | "Normal" => LogLevel::Normal,
            "Debug" => LogLevel::Debug,
            "Trace" => LogLevel::Trace,
            "TraceAll" => LogLevel::TraceAll,
            other => LogLevel::Unknown(other.to_string()),
        }
    }
}

impl From<String> for LogLevel {
    fn from(s: String) -> Self {
        LogLevel::from(s.as_str())
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        level.as_str().to_string()
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Proxy settings observed on the cluster Proxy resource status
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyStatus {
    /// Comma-separated hosts that bypass the proxy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_proxy: Option<String>,
    /// HTTP proxy URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_proxy: Option<String>,
    /// HTTPS proxy URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub https_proxy: Option<String>,
}

/// Spec of the Authentication operator resource
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationSpec {
    /// Requested operand log level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_level: Option<LogLevel>,
    /// Configuration assembled by the config observers
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub observed_config: Value,
}

/// Load a typed document from YAML or JSON text.
///
/// `kind` names the document in error messages.
pub fn load_document<T: DeserializeOwned>(input: &str, kind: &str) -> Result<T> {
    let value = yaml::parse_yaml(input)?;
    if value.is_null() {
        return Err(Error::validation(format!("{} document is empty", kind)));
    }
    serde_json::from_value(value).map_err(|e| Error::serialization(kind, e.to_string()))
}
