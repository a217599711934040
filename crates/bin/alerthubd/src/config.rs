//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `alerthub.toml` in the working directory, or at the path in
//! `ALERTHUB_CONFIG`. Every field has a sensible default so the file is
//! optional. Environment variables take precedence over file values.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Rule and user storage.
    pub storage: StorageConfig,
    /// Watcher and rule feed tuning.
    pub automation: AutomationConfig,
    /// Device liveness monitoring.
    pub heartbeat: HeartbeatConfig,
    /// Initial data loaded at boot.
    pub seed: SeedConfig,
    /// Virtual devices.
    pub simulator: SimulatorConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Which adapter stores rules and users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Memory,
    Sqlite,
}

/// Rule and user storage configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// `memory` or `sqlite`.
    pub backend: String,
    /// `SQLite` connection URL, used by the `sqlite` backend.
    pub database_url: String,
    /// How often the `sqlite` backend polls the rules table.
    pub rule_poll_interval_secs: u64,
}

/// Watcher and rule feed tuning.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AutomationConfig {
    /// Minimum spacing between fires of an event-mode rule. Unset disables it.
    pub event_cooldown_secs: Option<u64>,
    /// First delay before resubscribing to a failed rule feed.
    pub feed_retry_initial_ms: u64,
    /// Cap on the resubscription delay.
    pub feed_retry_max_secs: u64,
}

/// Heartbeat watchdog configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HeartbeatConfig {
    pub enabled: bool,
    /// Realtime path of the counter bumped by the device.
    pub path: String,
    /// Realtime path the online flag is written to.
    pub status_path: String,
    pub interval_secs: u64,
}

/// Optional JSON files loaded into the stores at boot.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    pub rules_file: Option<PathBuf>,
    pub users_file: Option<PathBuf>,
    pub realtime_file: Option<PathBuf>,
}

/// Virtual device configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Bump the heartbeat counter from inside the daemon.
    pub heartbeat_enabled: bool,
    pub heartbeat_interval_secs: u64,
}

impl Config {
    /// Load configuration from `alerthub.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("ALERTHUB_CONFIG").unwrap_or_else(|_| "alerthub.toml".to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("ALERTHUB_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("ALERTHUB_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("ALERTHUB_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Ok(val) = std::env::var("ALERTHUB_BACKEND") {
            self.storage.backend = val;
        }
        if let Ok(val) = std::env::var("ALERTHUB_DATABASE_URL") {
            self.storage.database_url = val;
        }
        if let Ok(val) = std::env::var("ALERTHUB_HEARTBEAT_PATH") {
            self.heartbeat.path = val;
        }
        if let Ok(val) = std::env::var("ALERTHUB_HEARTBEAT_INTERVAL_SECS") {
            if let Ok(secs) = val.parse() {
                self.heartbeat.interval_secs = secs;
            }
        }
        if let Ok(val) = std::env::var("ALERTHUB_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.heartbeat.interval_secs == 0 {
            return Err(ConfigError::Validation(
                "heartbeat interval must be positive".to_string(),
            ));
        }
        if self.simulator.heartbeat_enabled && self.simulator.heartbeat_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "simulator heartbeat interval must be positive".to_string(),
            ));
        }
        if self.automation.feed_retry_initial_ms == 0 || self.automation.feed_retry_max_secs == 0 {
            return Err(ConfigError::Validation(
                "feed retry delays must be positive".to_string(),
            ));
        }
        self.backend()?;
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// The configured storage backend.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an unrecognized backend name.
    pub fn backend(&self) -> Result<Backend, ConfigError> {
        match self.storage.backend.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Backend::Memory),
            "sqlite" => Ok(Backend::Sqlite),
            other => Err(ConfigError::Validation(format!(
                "unknown storage backend {other:?}"
            ))),
        }
    }

    #[must_use]
    pub fn rule_poll_interval(&self) -> Duration {
        Duration::from_secs(self.storage.rule_poll_interval_secs.max(1))
    }

    #[must_use]
    pub fn event_cooldown(&self) -> Option<Duration> {
        self.automation
            .event_cooldown_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    #[must_use]
    pub fn feed_retry_initial(&self) -> Duration {
        Duration::from_millis(self.automation.feed_retry_initial_ms)
    }

    #[must_use]
    pub fn feed_retry_max(&self) -> Duration {
        Duration::from_secs(self.automation.feed_retry_max_secs)
    }

    #[must_use]
    pub fn heartbeat_period(&self) -> Duration {
        Duration::from_secs(self.heartbeat.interval_secs)
    }

    #[must_use]
    pub fn simulator_period(&self) -> Duration {
        Duration::from_secs(self.simulator.heartbeat_interval_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "alerthubd=info,alerthub=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            database_url: "sqlite:alerthub.db?mode=rwc".to_string(),
            rule_poll_interval_secs: 5,
        }
    }
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            event_cooldown_secs: None,
            feed_retry_initial_ms: 1000,
            feed_retry_max_secs: 60,
        }
    }
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/heartbeat".to_string(),
            status_path: "/is_online".to_string(),
            interval_secs: 60,
        }
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            heartbeat_enabled: false,
            heartbeat_interval_secs: 30,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
