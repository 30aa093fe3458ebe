// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # opcsh-config
//!
//! Configuration management for the opcsh shell.
//!
//! ## Features
//!
//! - **Multi-Format Support**: YAML, TOML, and JSON configuration files
//! - **Placeholders**: `${VAR}` and `${VAR:default}` resolved from the environment
//! - **Environment Overrides**: `OPCSH_*` variables override file values
//! - **Validation**: the client section is checked by `opcsh-opcua` itself
//!
//! ## Quick Start
//!
//! ```no_run
//! use opcsh_config::loader::ConfigLoader;
//!
//! // Explicit file, or opcsh.{yaml,yml,toml,json} in the working directory,
//! // or built-in defaults.
//! let config = ConfigLoader::new().load_or_default(None).unwrap();
//! println!("Output: {:?}", config.shell.output);
//! ```
//!
//! ## Configuration Schema
//!
//! - `client` - OPC UA session negotiation (`opcsh_opcua::ClientConfig`)
//! - `logging` - Log level and format
//! - `shell` - Startup endpoint and output format

#![warn(missing_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod error;
pub mod loader;
pub mod schema;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    load_config, load_config_str, ConfigFormat, ConfigLoader, DEFAULT_CONFIG_FILES,
    DEFAULT_ENV_PREFIX,
};
pub use schema::{LogFormat, LogLevel, LoggingConfig, OutputFormat, ShellConfig, ShellSettings};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
