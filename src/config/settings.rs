//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from configuration files and environment variables.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub signal: SignalConfig,
    pub scenes: ScenesConfig,
    pub logging: LoggingConfig,
    pub debug: bool,
}

/// Connection settings for the signal-cli daemon
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SignalConfig {
    /// How often the connection is checked, in milliseconds
    pub connection_check_interval_ms: u64,
    /// D-Bus destination of the daemon
    pub destination: String,
    pub bus_type: BusType,
    pub account_mode: AccountMode,
    /// Phone number of the account, required in `multiple` mode
    pub account: Option<String>,
    pub transport: Transport,
}

/// How the client reaches the daemon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// signal-cli over D-Bus
    Dbus,
    /// stdin/stdout, for running flows locally
    Console,
}

/// Which D-Bus the daemon is reachable on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BusType {
    System,
    Session,
}

/// Whether the daemon serves one account or several
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountMode {
    Single,
    Multiple,
}

/// Conversation flow configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScenesConfig {
    /// Exact text that starts a new flow
    pub start_trigger: Option<String>,
    /// Idle time after which a flow is dropped
    pub performance_ttl_seconds: Option<u64>,
    pub sweep_interval_seconds: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    /// Directory for daily rolling log files; stdout only when unset
    pub file_path: Option<String>,
}

impl SignalConfig {
    pub fn connection_check_interval(&self) -> Duration {
        Duration::from_millis(self.connection_check_interval_ms)
    }
}

impl ScenesConfig {
    pub fn performance_ttl(&self) -> Option<chrono::Duration> {
        self.performance_ttl_seconds
            .map(|secs| chrono::Duration::seconds(secs as i64))
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds)
    }
}

impl Settings {
    /// Load settings from the default `config` file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        Self::load(config::File::with_name("config").required(false))
    }

    /// Load settings from a specific configuration file on top of the defaults
    pub fn from_file(path: &str) -> Result<Self, config::ConfigError> {
        Self::load(config::File::with_name(path).required(true))
    }

    fn load(file: config::File<config::FileSourceFile, config::FileFormat>) -> Result<Self, config::ConfigError> {
        let defaults = Settings::default();

        let settings = config::Config::builder()
            .set_default("signal.connection_check_interval_ms", defaults.signal.connection_check_interval_ms as i64)?
            .set_default("signal.destination", defaults.signal.destination)?
            .set_default("signal.bus_type", "system")?
            .set_default("signal.account_mode", "single")?
            .set_default("signal.transport", "dbus")?
            .set_default("scenes.sweep_interval_seconds", defaults.scenes.sweep_interval_seconds as i64)?
            .set_default("logging.level", defaults.logging.level)?
            .set_default("debug", defaults.debug)?
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("SIGNAL_BOT")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::SignalBotError> {
        super::validation::validate_settings(self)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            signal: SignalConfig {
                connection_check_interval_ms: 5000,
                destination: "org.asamk.Signal".to_string(),
                bus_type: BusType::System,
                account_mode: AccountMode::Single,
                account: None,
                transport: Transport::Dbus,
            },
            scenes: ScenesConfig {
                start_trigger: None,
                performance_ttl_seconds: None,
                sweep_interval_seconds: 60,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: None,
            },
            debug: false,
        }
    }
}
