// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI argument parsing and command definitions.
//!
//! Without a subcommand `opcsh` starts the interactive shell, optionally
//! connecting to the given endpoint first:
//!
//! - `opcsh [ENDPOINT]`: interactive shell (default)
//! - `validate`: validate the configuration file
//! - `version`: show version information

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use opcsh_config::ShellConfig;

// =============================================================================
// Main CLI Structure
// =============================================================================

/// opcsh - browse an OPC UA server's address space like a filesystem
#[derive(Parser, Debug)]
#[command(
    name = "opcsh",
    author = "Sylvex <contact@sylvex.io>",
    version = opcsh_opcua::VERSION,
    about = "Interactive OPC UA address-space shell",
    long_about = None,
    propagate_version = true
)]
pub struct Cli {
    /// Endpoint to connect to at startup (e.g. opc.tcp://localhost:4840)
    pub endpoint: Option<String>,

    /// Configuration file path (default: opcsh.{yaml,yml,toml,json} if present)
    #[arg(short, long, env = "OPCSH_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "OPCSH_LOG_LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Log format (text, json, compact)
    #[arg(long, env = "OPCSH_LOG_FORMAT", global = true)]
    pub log_format: Option<LogFormat>,

    /// How `ls` and `read` print results
    #[arg(short, long, env = "OPCSH_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

// =============================================================================
// Subcommands
// =============================================================================

/// Available subcommands for the opcsh CLI.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Validate the configuration file
    ///
    /// Loads the configuration the shell would use, applies environment
    /// overrides, and reports problems without contacting any server.
    Validate(ValidateArgs),

    /// Show detailed version information
    Version,
}

/// Arguments for the `validate` command.
#[derive(Args, Debug, Clone, Default)]
pub struct ValidateArgs {
    /// Show parsed configuration after validation
    #[arg(short, long)]
    pub show_config: bool,

    /// Strict mode: treat warnings as errors
    #[arg(long)]
    pub strict: bool,
}

// =============================================================================
// Enums
// =============================================================================

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format
    #[default]
    Text,
    /// JSON format for structured logging
    Json,
    /// Compact format for minimal output
    Compact,
}

impl From<LogFormat> for opcsh_config::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Text => Self::Text,
            LogFormat::Json => Self::Json,
            LogFormat::Compact => Self::Compact,
        }
    }
}

impl From<opcsh_config::LogFormat> for LogFormat {
    fn from(format: opcsh_config::LogFormat) -> Self {
        match format {
            opcsh_config::LogFormat::Text => Self::Text,
            opcsh_config::LogFormat::Json => Self::Json,
            opcsh_config::LogFormat::Compact => Self::Compact,
        }
    }
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Aligned text tables
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

impl From<OutputFormat> for opcsh_config::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => Self::Text,
            OutputFormat::Json => Self::Json,
        }
    }
}

// =============================================================================
// Helper Methods
// =============================================================================

impl Cli {
    /// Parse CLI arguments from the command line.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Check if verbose logging is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose && !self.quiet
    }

    /// Get the effective log level; flags win over `--log-level`, which wins
    /// over the configured level.
    pub fn effective_log_level<'a>(&'a self, config: &'a ShellConfig) -> &'a str {
        if self.quiet {
            "error"
        } else if self.verbose {
            "debug"
        } else {
            self.log_level
                .as_deref()
                .unwrap_or_else(|| config.logging.level.as_str())
        }
    }

    /// Get the effective log format.
    pub fn effective_log_format(&self, config: &ShellConfig) -> LogFormat {
        self.log_format
            .unwrap_or_else(|| LogFormat::from(config.logging.format))
    }

    /// Applies command-line values on top of a loaded configuration.
    pub fn apply_overrides(&self, config: &mut ShellConfig) {
        if let Some(endpoint) = &self.endpoint {
            config.shell.endpoint = Some(endpoint.clone());
        }
        if let Some(output) = self.output {
            config.shell.output = output.into();
        }
        if let Some(format) = self.log_format {
            config.logging.format = format.into();
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
