//! Engine configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (if specified via AETHERIUM_CONFIG or --config)
//! 3. Environment variables

use aetherium_transport::codec::LineFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Driving loop settings.
    pub engine: EngineConfig,
    /// Console transport settings.
    pub console: ConsoleConfig,
    /// Network settings, used by network mode.
    pub network: NetworkConfig,
}

impl Config {
    /// Loads configuration from file, then applies environment variable overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var("AETHERIUM_CONFIG") {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
        Ok(config)
    }

    /// Applies environment variable overrides to the configuration.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from an arbitrary key lookup.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        self.engine.apply_overrides(&lookup);
        self.console.apply_overrides(&lookup);
        self.network.apply_overrides(&lookup);
    }

    /// Checks that the settings are consistent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.poll_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "engine.poll_interval_ms must be greater than zero".to_string(),
            ));
        }

        if self.engine.mode == EngineMode::Network {
            if self.network.broker.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "network mode requires network.broker".to_string(),
                ));
            }
            if self.network.prefix.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "network mode requires network.prefix".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Saves configuration to a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = serde_yaml::to_string(self)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
        std::fs::write(path, content).map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
        Ok(())
    }
}

/// Where an engine gets its inputs from and sends its outputs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineMode {
    /// Console only.
    #[default]
    Detached,
    /// Through a message broker.
    Network,
}

impl EngineMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineMode::Detached => "detached",
            EngineMode::Network => "network",
        }
    }
}

impl std::fmt::Display for EngineMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "detached" => Ok(EngineMode::Detached),
            "network" => Ok(EngineMode::Network),
            other => Err(ConfigError::ValidationError(format!(
                "unknown mode '{}' (expected 'detached' or 'network')",
                other
            ))),
        }
    }
}

/// Driving loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub mode: EngineMode,
    /// Sleep between polls when a step did not transition.
    pub poll_interval_ms: u64,
    /// Stop after this many steps (0 = unlimited).
    pub max_steps: u64,
    /// Abort the run on the first evaluator failure.
    pub halt_on_error: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            mode: EngineMode::Detached,
            poll_interval_ms: 50,
            max_steps: 0, // unlimited
            halt_on_error: true,
        }
    }
}

impl EngineConfig {
    fn apply_overrides(&mut self, lookup: &impl Fn(&str) -> Option<String>) {
        if let Some(mode) = lookup("AETHERIUM_MODE") {
            match mode.parse() {
                Ok(parsed) => self.mode = parsed,
                Err(e) => tracing::warn!("Ignoring AETHERIUM_MODE: {}", e),
            }
        }

        if let Some(interval) = lookup("AETHERIUM_POLL_INTERVAL_MS") {
            if let Ok(ms) = interval.parse() {
                self.poll_interval_ms = ms;
            }
        }

        if let Some(max) = lookup("AETHERIUM_MAX_STEPS") {
            if let Ok(n) = max.parse() {
                self.max_steps = n;
            }
        }

        if let Some(halt) = lookup("AETHERIUM_HALT_ON_ERROR") {
            self.halt_on_error = halt == "1" || halt.to_lowercase() == "true";
        }
    }

    /// Returns the poll interval as Duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Returns the step limit, if any.
    pub fn step_limit(&self) -> Option<u64> {
        (self.max_steps > 0).then_some(self.max_steps)
    }
}

/// Line format of the console transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsoleFormat {
    #[default]
    Shorthand,
    Json,
}

/// Console transport configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub format: ConsoleFormat,
}

impl ConsoleConfig {
    fn apply_overrides(&mut self, lookup: &impl Fn(&str) -> Option<String>) {
        if let Some(format) = lookup("AETHERIUM_CONSOLE_FORMAT") {
            match format.to_lowercase().as_str() {
                "json" => self.format = ConsoleFormat::Json,
                "shorthand" => self.format = ConsoleFormat::Shorthand,
                other => tracing::warn!("Ignoring AETHERIUM_CONSOLE_FORMAT '{}'", other),
            }
        }
    }

    pub fn line_format(&self) -> LineFormat {
        match self.format {
            ConsoleFormat::Shorthand => LineFormat::Shorthand,
            ConsoleFormat::Json => LineFormat::Json,
        }
    }
}

/// Network configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Broker address.
    pub broker: String,
    /// Prefix of the topics an engine publishes and subscribes to.
    pub prefix: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            broker: "127.0.0.1:1883".to_string(),
            prefix: "aetherium".to_string(),
        }
    }
}

impl NetworkConfig {
    fn apply_overrides(&mut self, lookup: &impl Fn(&str) -> Option<String>) {
        if let Some(broker) = lookup("AETHERIUM_NETWORK_BROKER") {
            self.broker = broker;
        }
        if let Some(prefix) = lookup("AETHERIUM_NETWORK_PREFIX") {
            self.prefix = prefix;
        }
    }
}

/// Configuration error.
#[derive(Debug)]
pub enum ConfigError {
    IoError(PathBuf, std::io::Error),
    ParseError(PathBuf, String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(path, e) => {
                write!(f, "failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::ValidationError(msg) => {
                write!(f, "configuration validation failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
