//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::utils::errors::{SignalBotError, Result};
use super::{AccountMode, Settings};

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_signal_config(&settings.signal)?;
    validate_scenes_config(&settings.scenes)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate signal daemon connection settings
pub fn validate_signal_config(config: &super::SignalConfig) -> Result<()> {
    if config.connection_check_interval_ms == 0 {
        return Err(SignalBotError::Config(
            "Connection check interval must be greater than 0".to_string()
        ));
    }

    if config.destination.trim().is_empty() {
        return Err(SignalBotError::Config(
            "D-Bus destination is required".to_string()
        ));
    }

    if config.account_mode == AccountMode::Multiple {
        let has_account = config.account.as_ref().map_or(false, |a| !a.trim().is_empty());
        if !has_account {
            return Err(SignalBotError::Config(
                "An account is required when account_mode is 'multiple'".to_string()
            ));
        }
    }

    Ok(())
}

/// Validate conversation flow settings
fn validate_scenes_config(config: &super::ScenesConfig) -> Result<()> {
    if let Some(trigger) = &config.start_trigger {
        if trigger.trim().is_empty() {
            return Err(SignalBotError::Config(
                "Start trigger cannot be blank".to_string()
            ));
        }
    }

    if config.performance_ttl_seconds == Some(0) {
        return Err(SignalBotError::Config(
            "Performance TTL must be greater than 0".to_string()
        ));
    }

    if config.sweep_interval_seconds == 0 {
        return Err(SignalBotError::Config(
            "Sweep interval must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(SignalBotError::Config(
            "Log level is required".to_string()
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(SignalBotError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        assert!(validate_settings(&Settings::default()).is_ok());
    }

    #[test]
    fn test_multiple_mode_requires_account() {
        let mut settings = Settings::default();
        settings.signal.account_mode = AccountMode::Multiple;
        assert!(validate_settings(&settings).is_err());

        settings.signal.account = Some("+15550001111".to_string());
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut settings = Settings::default();
        settings.signal.connection_check_interval_ms = 0;
        assert!(validate_settings(&settings).is_err());

        let mut settings = Settings::default();
        settings.signal.destination = "  ".to_string();
        assert!(validate_settings(&settings).is_err());

        let mut settings = Settings::default();
        settings.scenes.start_trigger = Some(" ".to_string());
        assert!(validate_settings(&settings).is_err());

        let mut settings = Settings::default();
        settings.scenes.performance_ttl_seconds = Some(0);
        assert!(validate_settings(&settings).is_err());

        let mut settings = Settings::default();
        settings.logging.level = "verbose".to_string();
        assert!(validate_settings(&settings).is_err());
    }
}
