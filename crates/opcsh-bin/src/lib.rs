// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # opcsh-bin
//!
//! The `opcsh` binary: an interactive shell over one OPC UA session.
//!
//! - CLI argument parsing with clap
//! - Logging initialization (stderr)
//! - The command loop and its output formatting
//! - Command implementations (shell, validate, version)
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                   main.rs                    │
//! └──────────────────────┬───────────────────────┘
//!                        │
//!                 ┌──────▼──────┐
//!                 │   cli.rs    │
//!                 └──────┬──────┘
//!                        │
//!            ┌───────────┼───────────┐
//!            ▼           ▼           ▼
//!      ┌──────────┐ ┌─────────┐ ┌─────────┐
//!      │ commands │ │  shell  │ │ logging │
//!      └────┬─────┘ └────┬────┘ └─────────┘
//!           │            │
//!     ┌─────▼──────┐ ┌───▼─────────┐
//!     │opcsh-config│ │ opcsh-opcua │
//!     └────────────┘ └─────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the shell
//! opcsh
//!
//! # Connect right away
//! opcsh opc.tcp://localhost:4840
//!
//! # JSON output for `ls` and `read`
//! opcsh -o json opc.tcp://localhost:4840
//!
//! # Validate configuration
//! opcsh validate -c opcsh.yaml --show-config
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

// =============================================================================
// Modules
// =============================================================================

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod shell;

// =============================================================================
// Re-exports
// =============================================================================

pub use cli::{Cli, Commands};
pub use error::{BinError, BinResult};
pub use logging::init_logging;
pub use shell::{Command, Flow, Shell};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
