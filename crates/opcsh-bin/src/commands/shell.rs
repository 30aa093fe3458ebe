// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the default command: the interactive shell.

use tracing::info;

use crate::cli::Cli;
use crate::error::BinResult;
use crate::logging::init_logging;

use super::load_config;

/// Starts the shell, connecting first when an endpoint is configured.
///
/// A failed startup connection ends the program after the failure message,
/// without entering the loop.
pub async fn shell(cli: &Cli) -> BinResult<()> {
    let config = load_config(cli)?;
    init_logging(
        cli.effective_log_level(&config),
        cli.effective_log_format(&config),
    )?;

    info!(
        version = opcsh_opcua::VERSION,
        endpoint = config.shell.endpoint.as_deref().unwrap_or("-"),
        "Starting opcsh"
    );

    run(config).await
}

#[cfg(feature = "real-transport")]
async fn run(config: opcsh_config::ShellConfig) -> BinResult<()> {
    use opcsh_opcua::RealOpcUaConnector;
    use tokio::io::BufReader;

    use crate::shell::Shell;

    let mut shell = Shell::new(
        RealOpcUaConnector::new(),
        config.client,
        config.shell.output,
        std::io::stdout(),
    );

    if let Some(endpoint) = &config.shell.endpoint {
        if !shell.connect(endpoint).await? {
            return Ok(());
        }
    }

    shell
        .run(BufReader::new(tokio::io::stdin()))
        .await
        .map_err(|e| e.with_context("command loop"))
}

#[cfg(not(feature = "real-transport"))]
async fn run(_config: opcsh_config::ShellConfig) -> BinResult<()> {
    Err(crate::error::BinError::init(
        "opcsh was built without the real-transport feature",
    ))
}
