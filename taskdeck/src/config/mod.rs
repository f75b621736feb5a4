//! Configuration system for the `TaskDeck` client.
//!
//! Layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/taskdeck/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::store::{Filter, TokenFile};

/// Default API base URL (the public sandbox).
const DEFAULT_BASE_URL: &str = "https://sandbox.api.todoapp.com/v1";

/// Default per-request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    api: ApiFileConfig,
    auth: AuthFileConfig,
}

/// `[api]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ApiFileConfig {
    base_url: Option<String>,
    request_timeout_secs: Option<u64>,
}

/// `[auth]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct AuthFileConfig {
    token_file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "taskdeck", version, about = "Terminal task client with optimistic sync")]
pub struct CliArgs {
    /// Path to the config file (default: `~/.config/taskdeck/config.toml`).
    #[arg(long, env = "TASKDECK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Base URL of the task API.
    #[arg(long, env = "TASKDECK_API_URL")]
    pub base_url: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long, env = "TASKDECK_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Where the bearer token is persisted.
    #[arg(long, env = "TASKDECK_TOKEN_FILE")]
    pub token_file: Option<PathBuf>,

    /// Log level filter when `RUST_LOG` is unset.
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Write logs to this file instead of stderr.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands, one per boundary operation.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and persist the bearer token.
    Login {
        /// Account email address.
        #[arg(long)]
        email: String,
        /// Account password.
        #[arg(long, env = "TASKDECK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Register a new account.
    Register {
        /// Account email address.
        #[arg(long)]
        email: String,
        /// Account password.
        #[arg(long, env = "TASKDECK_PASSWORD", hide_env_values = true)]
        password: String,
        /// Optional display username.
        #[arg(long)]
        username: Option<String>,
    },
    /// Forget the persisted token.
    Logout,
    /// Fetch and print the task list.
    List {
        /// Which tasks to show: all, active, or completed.
        #[arg(long, default_value = "all")]
        filter: Filter,
        /// Case-insensitive title substring to search for.
        #[arg(long, default_value = "")]
        search: String,
    },
    /// Add a task (optimistically).
    Add {
        /// Title of the new task.
        title: String,
    },
    /// Toggle completion of a task.
    Done {
        /// Task id.
        id: String,
    },
    /// Delete a task.
    Rm {
        /// Task id.
        id: String,
    },
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the task API.
    pub base_url: String,
    /// Per-request timeout; exceeding it aborts the request.
    pub request_timeout: Duration,
    /// Token persistence location; `None` disables persistence.
    pub token_file: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            token_file: TokenFile::default_path(),
        }
    }
}

impl ClientConfig {
    /// Loads and resolves configuration from CLI args, the config
    /// file, and defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when an explicitly given config file
    /// cannot be read, or when the file fails to parse.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = Self::read_config_file(cli.config.as_ref())?;
        Ok(Self {
            base_url: cli
                .base_url
                .clone()
                .or(file.api.base_url)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            request_timeout: Duration::from_secs(
                cli.timeout_secs
                    .or(file.api.request_timeout_secs)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            token_file: cli
                .token_file
                .clone()
                .or(file.auth.token_file)
                .or_else(TokenFile::default_path),
        })
    }

    /// Reads the config file. An explicit path must exist; the default
    /// path is optional.
    fn read_config_file(explicit: Option<&PathBuf>) -> Result<ConfigFile, ConfigError> {
        let (path, required) = match explicit {
            Some(path) => (path.clone(), true),
            None => {
                let Some(dir) = dirs::config_dir() else {
                    return Ok(ConfigFile::default());
                };
                (dir.join("taskdeck").join("config.toml"), false)
            }
        };
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(source) if required => return Err(ConfigError::ReadFile { path, source }),
            Err(_) => return Ok(ConfigFile::default()),
        };
        Ok(toml::from_str(&contents)?)
    }
}
