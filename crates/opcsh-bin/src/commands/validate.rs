// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Implementation of the `validate` command.

use std::path::Path;

use opcsh_config::{ConfigLoader, OutputFormat, ShellConfig};
use opcsh_opcua::UserTokenType;

use crate::cli::{Cli, ValidateArgs};
use crate::error::{BinError, BinResult};

use super::load_config;

const REDACTED: &str = "********";

/// Executes the `validate` command to validate configuration.
pub fn validate(cli: &Cli, args: ValidateArgs) -> BinResult<()> {
    let source = match &cli.config {
        Some(path) => path.display().to_string(),
        None => ConfigLoader::new()
            .find_default_file()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "(built-in defaults)".to_string()),
    };

    let config = load_config(cli)
        .map_err(|e| BinError::config(format!("Configuration validation failed: {}", e)))?;
    // Command-line values are not checked by the loader.
    config
        .validate()
        .map_err(|e| BinError::config(format!("Configuration validation failed: {}", e)))?;

    let warnings = collect_warnings(&config);
    let shown = redacted(&config);

    match config.shell.output {
        OutputFormat::Text => {
            println!("✓ Configuration is valid: {}", source);
            println!();
            println!("Summary:");
            println!(
                "  Endpoint:      {}",
                config.shell.endpoint.as_deref().unwrap_or("(none)")
            );
            println!("  Application:   {}", config.client.application_name);
            println!(
                "  Security:      {} / {}",
                config.client.security_mode, config.client.security_policy
            );
            println!("  Identity:      {}", config.client.user_token);
            println!(
                "  Timeouts:      session {}, request {}",
                humanize(config.client.session_timeout),
                humanize(config.client.request_timeout)
            );
            println!("  Concurrency:   {}", config.client.browse_concurrency);
            println!("  Log level:     {}", config.logging.level);

            if !warnings.is_empty() {
                println!();
                println!("Warnings:");
                for warning in &warnings {
                    println!("  ⚠ {}", warning);
                }
            }

            if args.show_config {
                println!();
                println!("Parsed configuration:");
                println!("{}", serde_json::to_string_pretty(&shown)?);
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "valid": true,
                "config_source": source,
                "summary": {
                    "endpoint": config.shell.endpoint,
                    "application_name": config.client.application_name,
                    "security_mode": config.client.security_mode.to_string(),
                    "security_policy": config.client.security_policy.to_string(),
                    "browse_concurrency": config.client.browse_concurrency,
                },
                "warnings": warnings,
                "config": if args.show_config { Some(&shown) } else { None },
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    if args.strict && !warnings.is_empty() {
        return Err(BinError::config(format!(
            "Strict mode: {} warning(s) found",
            warnings.len()
        )));
    }

    Ok(())
}

fn humanize(duration: std::time::Duration) -> String {
    humantime::format_duration(duration).to_string()
}

/// Settings that are valid but probably not what the user wants.
pub(crate) fn collect_warnings(config: &ShellConfig) -> Vec<String> {
    let mut warnings = Vec::new();
    let client = &config.client;

    if config.shell.endpoint.is_none() {
        warnings.push("No startup endpoint configured; use `connect <address>` in the shell".into());
    }

    if client.uses_security() && client.trust_all_certificates {
        warnings.push("Server certificates are trusted without verification".into());
    }

    if let Some(dir) = &client.pki_dir {
        if !Path::new(dir).is_dir() {
            warnings.push(format!("PKI directory does not exist: {}", dir));
        }
    }

    if !client.uses_security() && !client.user_token.is_anonymous() {
        warnings.push("User credentials are sent without message security".into());
    }

    warnings
}

fn redacted(config: &ShellConfig) -> ShellConfig {
    let mut shown = config.clone();
    if let UserTokenType::UserName { password, .. } = &mut shown.client.user_token {
        *password = REDACTED.to_string();
    }
    shown
}
