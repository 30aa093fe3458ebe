// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration schema for opcsh.
//!
//! # Schema Structure
//!
//! ```text
//! ShellConfig
//! ├── client: ClientConfig      (session negotiation, from opcsh-opcua)
//! ├── logging: LoggingConfig
//! └── shell: ShellSettings
//! ```
//!
//! # Example
//!
//! ```yaml
//! client:
//!   application_name: opcsh
//!   session_timeout: 60s
//!   security_mode: none
//!   browse_concurrency: 4
//!
//! logging:
//!   level: info
//!   format: compact
//!
//! shell:
//!   endpoint: "opc.tcp://localhost:4840"
//!   output: text
//! ```

use std::fmt;
use std::str::FromStr;

use opcsh_opcua::types::endpoint_problem;
use opcsh_opcua::ClientConfig;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

// =============================================================================
// Constants
// =============================================================================

/// Upper bound for `client.browse_concurrency`.
pub const MAX_BROWSE_CONCURRENCY: usize = 64;

// =============================================================================
// ShellConfig
// =============================================================================

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShellConfig {
    /// OPC UA client settings.
    #[serde(default)]
    pub client: ClientConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Interactive shell settings.
    #[serde(default)]
    pub shell: ShellSettings,
}

impl ShellConfig {
    /// Validates every section.
    pub fn validate(&self) -> ConfigResult<()> {
        self.client.validate()?;

        if self.client.browse_concurrency > MAX_BROWSE_CONCURRENCY {
            return Err(ConfigError::out_of_range(
                "client.browse_concurrency",
                self.client.browse_concurrency,
                1,
                MAX_BROWSE_CONCURRENCY,
            ));
        }

        self.shell.validate()
    }
}

// =============================================================================
// Logging Configuration
// =============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level.
    #[serde(default)]
    pub level: LogLevel,

    /// Log format.
    #[serde(default)]
    pub format: LogFormat,
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    Info,
    /// Warning level.
    #[default]
    Warn,
    /// Error level.
    Error,
}

impl LogLevel {
    /// Returns the filter directive for this level.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            other => Err(ConfigError::validation(
                "logging.level",
                format!("unknown level '{}'", other),
            )),
        }
    }
}

/// Log format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// Compact lines.
    Compact,
    /// JSON lines.
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(ConfigError::validation(
                "logging.format",
                format!("unknown format '{}'", other),
            )),
        }
    }
}

// =============================================================================
// Shell Settings
// =============================================================================

/// Interactive shell settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellSettings {
    /// Endpoint to connect to at startup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// How `read` and `ls` print their results.
    #[serde(default)]
    pub output: OutputFormat,
}

impl ShellSettings {
    /// Validates the shell settings.
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(endpoint) = &self.endpoint {
            if let Some(reason) = endpoint_problem(endpoint) {
                return Err(ConfigError::validation("shell.endpoint", reason));
            }
        }
        Ok(())
    }
}

/// Result rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Aligned text tables.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(ConfigError::validation(
                "shell.output",
                format!("unknown output format '{}'", other),
            )),
        }
    }
}
