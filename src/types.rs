//! Common types used throughout the connector
//!
//! Shared enums and type aliases used across multiple modules.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

// ============================================================================
// Sampling Level
// ============================================================================

/// Precision/performance tradeoff requested from the reporting API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SamplingLevel {
    /// Balanced sample size
    Default,
    /// Smaller sample, faster response
    Small,
    /// Largest sample the API allows
    #[default]
    Large,
}

impl SamplingLevel {
    /// API wire name
    pub fn as_str(self) -> &'static str {
        match self {
            SamplingLevel::Default => "DEFAULT",
            SamplingLevel::Small => "SMALL",
            SamplingLevel::Large => "LARGE",
        }
    }
}

// ============================================================================
// Existing Table Policy
// ============================================================================

/// What the table writer does when the destination table already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IfExists {
    /// Refuse to write
    #[default]
    Fail,
    /// Drop and recreate the table
    Replace,
    /// Insert into the existing table as-is
    Append,
}

impl fmt::Display for IfExists {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IfExists::Fail => "fail",
            IfExists::Replace => "replace",
            IfExists::Append => "append",
        };
        f.write_str(s)
    }
}

impl FromStr for IfExists {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "fail" => Ok(IfExists::Fail),
            "replace" => Ok(IfExists::Replace),
            "append" => Ok(IfExists::Append),
            other => Err(Error::invalid_value(
                "if_exists",
                format!("expected one of fail, replace, append; got '{other}'"),
            )),
        }
    }
}

// ============================================================================
// Analytics Services
// ============================================================================

/// The two analytics APIs the connector talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiService {
    /// Reporting API v4 (batchGet)
    Reporting,
    /// Management / core reporting API v3
    Management,
}

impl ApiService {
    /// OAuth scopes requested for this service
    pub fn scopes(self) -> &'static [&'static str] {
        match self {
            ApiService::Reporting => &["https://www.googleapis.com/auth/analytics.readonly"],
            ApiService::Management => &["https://www.googleapis.com/auth/analytics"],
        }
    }
}
