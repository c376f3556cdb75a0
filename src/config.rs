//! Runtime configuration.
//!
//! Loaded from a TOML file; every field has a default so a missing file or
//! a partial file is fine:
//!
//! ```toml
//! [server]
//! bind_addr = "0.0.0.0:8080"
//! solve_timeout_secs = 10
//!
//! [solver]
//! max_variables = 1000000
//! threads = 1
//! random_seed = 1234
//! log_to_console = false
//!
//! [logging]
//! level = "debug"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Env var naming the config file. Falls back to [`DEFAULT_CONFIG_FILE`].
pub const CONFIG_ENV_VAR: &str = "TIMETABLE_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "timetable.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub solver: SolverOptions,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Deadline for a single solve request; past it the request reports an
    /// unknown outcome.
    pub solve_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            solve_timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    pub fn solve_timeout(&self) -> Duration {
        Duration::from_secs(self.solve_timeout_secs)
    }
}

/// Model size cap plus options passed straight through to HiGHS.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SolverOptions {
    /// Largest courses x teachers x slots cube accepted; bigger instances
    /// are rejected as invalid input before anything is allocated.
    pub max_variables: usize,
    pub threads: i32,
    pub random_seed: i32,
    pub log_to_console: bool,
}

impl Default for SolverOptions {
    fn default() -> Self {
        // single thread + fixed seed keeps tie-breaking reproducible
        Self {
            max_variables: 1_000_000,
            threads: 1,
            random_seed: 1234,
            log_to_console: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `env_logger` filter; `RUST_LOG` wins when set.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Loads the file named by `TIMETABLE_CONFIG`, or `timetable.toml`.
    /// A missing file gives the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os(CONFIG_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::load_or_default(path)
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path.as_ref()) {
            Ok(contents) => Self::from_toml_str(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.solver.max_variables == 0 {
            return Err(ConfigError::Invalid(
                "solver.max_variables must be positive".to_string(),
            ));
        }
        if self.solver.threads < 1 {
            return Err(ConfigError::Invalid(format!(
                "solver.threads must be at least 1, got {}",
                self.solver.threads
            )));
        }
        if self.server.solve_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "server.solve_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
