//! Error handling for signal-bot
//!
//! This module defines the main error type used throughout the crate
//! and classifies errors by recoverability and severity.

use thiserror::Error;

/// Main error type for the signal-bot crate
#[derive(Error, Debug)]
pub enum SignalBotError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration loading error: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    #[error("At least one scene must be registered")]
    NoScenesRegistered,

    #[error("Every scene needs a unique name, found duplicate: {name}")]
    DuplicateScene { name: String },

    #[error("Scene manager must be verified before performing")]
    NotVerified,

    #[error("Unknown scene: {name}")]
    UnknownScene { name: String },

    #[error("Scene handler for '{scene}' failed: {reason}")]
    Handler { scene: String, reason: String },

    #[error("Bus error: {0}")]
    Bus(String),

    #[error("D-Bus error: {0}")]
    Dbus(#[from] zbus::Error),

    #[error("Disconnected from the signal daemon")]
    Disconnected,

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for signal-bot operations
pub type Result<T> = std::result::Result<T, SignalBotError>;

impl SignalBotError {
    /// Create a handler error for the given scene
    pub fn handler(scene: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        SignalBotError::Handler {
            scene: scene.into(),
            reason: reason.to_string(),
        }
    }

    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            SignalBotError::Config(_) => false,
            SignalBotError::ConfigLoad(_) => false,
            SignalBotError::NoScenesRegistered => false,
            SignalBotError::DuplicateScene { .. } => false,
            SignalBotError::NotVerified => false,
            SignalBotError::UnknownScene { .. } => true,
            SignalBotError::Handler { .. } => true,
            SignalBotError::Bus(_) => true,
            SignalBotError::Dbus(_) => true,
            SignalBotError::Disconnected => false,
            SignalBotError::LockPoisoned(_) => false,
            SignalBotError::InvalidInput(_) => true,
            SignalBotError::Serialization(_) => true,
        }
    }

    /// Check if the error comes from a misconfigured bot rather than a single conversation
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SignalBotError::Config(_)
                | SignalBotError::ConfigLoad(_)
                | SignalBotError::NoScenesRegistered
                | SignalBotError::DuplicateScene { .. }
                | SignalBotError::NotVerified
        )
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            SignalBotError::Config(_) => ErrorSeverity::Critical,
            SignalBotError::ConfigLoad(_) => ErrorSeverity::Critical,
            SignalBotError::NoScenesRegistered => ErrorSeverity::Critical,
            SignalBotError::DuplicateScene { .. } => ErrorSeverity::Critical,
            SignalBotError::NotVerified => ErrorSeverity::Critical,
            SignalBotError::LockPoisoned(_) => ErrorSeverity::Critical,
            SignalBotError::Disconnected => ErrorSeverity::Warning,
            SignalBotError::InvalidInput(_) => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
