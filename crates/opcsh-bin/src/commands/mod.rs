// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! CLI command implementations.
//!
//! - (default): run the interactive shell
//! - `validate`: validate configuration
//! - `version`: show version information

mod shell;
mod validate;
mod version;

pub use shell::shell;
pub use validate::validate;
pub use version::version;

use opcsh_config::{ConfigLoader, ShellConfig};

use crate::cli::{Cli, Commands};
use crate::error::BinResult;

/// Executes the appropriate command based on CLI arguments.
pub async fn execute(cli: Cli) -> BinResult<()> {
    match cli.command.clone() {
        None => shell::shell(&cli).await,
        Some(Commands::Validate(args)) => validate::validate(&cli, args),
        Some(Commands::Version) => version::version(&cli),
    }
}

/// Loads the configuration and layers the command-line values on top.
///
/// Precedence, lowest first: built-in defaults, config file, `OPCSH_*`
/// environment, command line.
pub fn load_config(cli: &Cli) -> BinResult<ShellConfig> {
    let mut config = ConfigLoader::new().load_or_default(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);
    Ok(config)
}
