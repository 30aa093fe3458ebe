// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration loading for opcsh.
//!
//! # Loading Pipeline
//!
//! 1. Pick the file: the one given explicitly, else the first default file
//!    found, else built-in defaults
//! 2. Resolve `${VAR}` / `${VAR:default}` placeholders in the raw content
//! 3. Parse YAML/TOML/JSON by extension
//! 4. Apply environment variable overrides
//! 5. Validate
//!
//! # Environment Variable Override
//!
//! ```text
//! OPCSH_ENDPOINT=opc.tcp://plc-7:4840
//! OPCSH_LOG_LEVEL=debug
//! OPCSH_SESSION_TIMEOUT=30s
//! OPCSH_TRUST_ALL_CERTIFICATES=true
//! OPCSH_BROWSE_CONCURRENCY=8
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use opcsh_opcua::{SecurityMode, SecurityPolicy, UserTokenType};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::error::{ConfigError, ConfigResult};
use crate::schema::ShellConfig;

/// File names probed, in order, when no config file is given.
pub const DEFAULT_CONFIG_FILES: [&str; 4] = ["opcsh.yaml", "opcsh.yml", "opcsh.toml", "opcsh.json"];

/// Default environment variable prefix.
pub const DEFAULT_ENV_PREFIX: &str = "OPCSH";

// =============================================================================
// ConfigLoader
// =============================================================================

/// Configuration loader.
///
/// # Examples
///
/// ```no_run
/// use opcsh_config::loader::ConfigLoader;
///
/// let config = ConfigLoader::new().load("opcsh.yaml").unwrap();
/// println!("{:?}", config.shell.endpoint);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Environment variable prefix.
    env_prefix: String,

    /// Whether placeholders and overrides are taken from the environment.
    resolve_env_vars: bool,

    /// Directory probed for default config files.
    search_dir: PathBuf,
}

impl ConfigLoader {
    /// Creates a loader with default settings.
    pub fn new() -> Self {
        Self {
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
            resolve_env_vars: true,
            search_dir: PathBuf::from("."),
        }
    }

    /// Sets the environment variable prefix.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Enables or disables environment variable resolution.
    pub fn with_env_vars(mut self, enabled: bool) -> Self {
        self.resolve_env_vars = enabled;
        self
    }

    /// Sets the directory probed for default config files.
    pub fn with_search_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_dir = dir.into();
        self
    }

    /// Loads configuration from a file.
    ///
    /// The format follows the extension: `.yaml`/`.yml`, `.toml` or `.json`.
    ///
    /// # Errors
    ///
    /// `FileNotFound` if the file does not exist, otherwise parse, override
    /// and validation errors.
    pub fn load(&self, path: impl AsRef<Path>) -> ConfigResult<ShellConfig> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading configuration");

        let format = ConfigFormat::from_path(path)?;
        let content = self.read_file(path)?;
        let content = self.resolve_placeholders(&content);

        let mut config: ShellConfig = parse_str(&content, format).map_err(|e| match e {
            ConfigError::Serialization { message } => ConfigError::parse(path, message),
            other => other,
        })?;

        self.finish(&mut config)?;
        debug!(
            endpoint = config.shell.endpoint.as_deref().unwrap_or("-"),
            level = %config.logging.level,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Loads `path` if given, else the first default file in the search
    /// directory, else built-in defaults.
    ///
    /// Only an explicitly given file must exist.
    pub fn load_or_default(&self, path: Option<&Path>) -> ConfigResult<ShellConfig> {
        if let Some(path) = path {
            return self.load(path);
        }

        match self.find_default_file() {
            Some(found) => self.load(found),
            None => {
                debug!(dir = %self.search_dir.display(), "No config file found, using defaults");
                let mut config = ShellConfig::default();
                self.finish(&mut config)?;
                Ok(config)
            }
        }
    }

    /// Loads configuration from a string.
    pub fn load_from_str(&self, content: &str, format: ConfigFormat) -> ConfigResult<ShellConfig> {
        let content = self.resolve_placeholders(content);
        let mut config = parse_str(&content, format)?;
        self.finish(&mut config)?;
        Ok(config)
    }

    /// Returns the first default config file present in the search directory.
    pub fn find_default_file(&self) -> Option<PathBuf> {
        DEFAULT_CONFIG_FILES
            .iter()
            .map(|name| self.search_dir.join(name))
            .find(|candidate| candidate.is_file())
    }

    fn finish(&self, config: &mut ShellConfig) -> ConfigResult<()> {
        if self.resolve_env_vars {
            self.apply_env_overrides(config)?;
        }
        config.validate()
    }

    fn read_file(&self, path: &Path) -> ConfigResult<String> {
        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }
        fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))
    }

    fn resolve_placeholders(&self, content: &str) -> String {
        if self.resolve_env_vars {
            resolve_env_placeholders(content)
        } else {
            content.to_string()
        }
    }

    fn var(&self, suffix: &str) -> Option<(String, String)> {
        let name = format!("{}_{}", self.env_prefix, suffix);
        env::var(&name).ok().map(|value| (name, value))
    }

    /// Applies `<PREFIX>_*` environment variable overrides.
    fn apply_env_overrides(&self, config: &mut ShellConfig) -> ConfigResult<()> {
        if let Some((_, value)) = self.var("ENDPOINT") {
            config.shell.endpoint = Some(value);
        }
        if let Some((name, value)) = self.var("OUTPUT") {
            config.shell.output = value
                .parse()
                .map_err(|e: ConfigError| ConfigError::invalid_env_var(name, e.to_string()))?;
        }

        if let Some((name, value)) = self.var("LOG_LEVEL") {
            config.logging.level = value
                .parse()
                .map_err(|e: ConfigError| ConfigError::invalid_env_var(name, e.to_string()))?;
        }
        if let Some((name, value)) = self.var("LOG_FORMAT") {
            config.logging.format = value
                .parse()
                .map_err(|e: ConfigError| ConfigError::invalid_env_var(name, e.to_string()))?;
        }

        let client = &mut config.client;
        if let Some((name, value)) = self.var("SESSION_TIMEOUT") {
            client.session_timeout = humantime::parse_duration(&value)
                .map_err(|e| ConfigError::invalid_env_var(name, e.to_string()))?;
        }
        if let Some((name, value)) = self.var("REQUEST_TIMEOUT") {
            client.request_timeout = humantime::parse_duration(&value)
                .map_err(|e| ConfigError::invalid_env_var(name, e.to_string()))?;
        }
        if let Some((_, value)) = self.var("TRUST_ALL_CERTIFICATES") {
            client.trust_all_certificates = parse_bool(&value);
        }
        if let Some((name, value)) = self.var("BROWSE_CONCURRENCY") {
            client.browse_concurrency = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid_env_var(name, "expected a positive number"))?;
        }
        if let Some((name, value)) = self.var("SECURITY_MODE") {
            client.security_mode = value
                .parse::<SecurityMode>()
                .map_err(|e| ConfigError::invalid_env_var(name, e.to_string()))?;
        }
        if let Some((name, value)) = self.var("SECURITY_POLICY") {
            client.security_policy = value
                .parse::<SecurityPolicy>()
                .map_err(|e| ConfigError::invalid_env_var(name, e.to_string()))?;
        }
        if let Some((_, username)) = self.var("USERNAME") {
            let password = self.var("PASSWORD").map(|(_, p)| p).unwrap_or_default();
            client.user_token = UserTokenType::UserName { username, password };
        }

        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// ConfigFormat
// =============================================================================

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML format.
    Yaml,
    /// TOML format.
    Toml,
    /// JSON format.
    Json,
}

impl ConfigFormat {
    /// Determines the format from a file path.
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            Some("toml") => Ok(ConfigFormat::Toml),
            Some("json") => Ok(ConfigFormat::Json),
            Some(other) => Err(ConfigError::unsupported_format(other)),
            None => Err(ConfigError::unsupported_format("(no extension)")),
        }
    }

    /// Returns the file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Yaml => "yaml",
            ConfigFormat::Toml => "toml",
            ConfigFormat::Json => "json",
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn parse_str<T: DeserializeOwned>(content: &str, format: ConfigFormat) -> ConfigResult<T> {
    match format {
        ConfigFormat::Yaml => parse_yaml(content),
        ConfigFormat::Toml => {
            toml::from_str(content).map_err(|e| ConfigError::serialization(e.to_string()))
        }
        ConfigFormat::Json => {
            serde_json::from_str(content).map_err(|e| ConfigError::serialization(e.to_string()))
        }
    }
}

/// YAML goes through the `config` crate.
fn parse_yaml<T: DeserializeOwned>(content: &str) -> ConfigResult<T> {
    let config = config::Config::builder()
        .add_source(config::File::from_str(content, config::FileFormat::Yaml))
        .build()
        .map_err(|e| ConfigError::serialization(e.to_string()))?;

    config
        .try_deserialize()
        .map_err(|e| ConfigError::serialization(e.to_string()))
}

/// Replaces `${VAR}` and `${VAR:default}`.
///
/// An unset variable without default is left in place.
fn resolve_env_placeholders(content: &str) -> String {
    let mut result = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(start) = rest.find("${") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let Some(end) = after.find('}') else {
            result.push_str(&rest[start..]);
            return result;
        };

        let inner = &after[..end];
        let (name, default) = match inner.split_once(':') {
            Some((name, default)) => (name, Some(default)),
            None => (inner, None),
        };

        match (env::var(name), default) {
            (Ok(value), _) => result.push_str(&value),
            (Err(_), Some(default)) => result.push_str(default),
            (Err(_), None) => {
                warn!(variable = name, "Environment variable not set");
                result.push_str(&rest[start..start + 2 + end + 1]);
            }
        }
        rest = &after[end + 1..];
    }

    result.push_str(rest);
    result
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "1" | "yes" | "on" | "enabled"
    )
}

// =============================================================================
// Convenience Functions
// =============================================================================

/// Loads configuration from a file with default settings.
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<ShellConfig> {
    ConfigLoader::new().load(path)
}

/// Loads configuration from a string with default settings.
pub fn load_config_str(content: &str, format: ConfigFormat) -> ConfigResult<ShellConfig> {
    ConfigLoader::new().load_from_str(content, format)
}

// =============================================================================
// Tests
// =============================================================================
