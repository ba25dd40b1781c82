//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the bot.

use tracing::{info, warn, error, debug};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};
use crate::config::LoggingConfig;
use crate::utils::errors::{SignalBotError, Result};

/// Initialize logging based on configuration.
///
/// The returned guard flushes the file writer on drop and must be kept alive
/// for as long as the process logs to a file.
pub fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = tracing_subscriber::EnvFilter::try_new(&config.level)
        .map_err(|e| SignalBotError::Config(format!("Invalid log filter: {}", e)))?;

    let (file_layer, guard) = match &config.file_path {
        Some(dir) => {
            let file_appender = tracing_appender::rolling::daily(dir, "signal-bot.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(non_blocking)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .with(file_layer)
        .try_init()
        .map_err(|e| SignalBotError::Config(format!("Failed to install logger: {}", e)))?;

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log the start of a new flow
pub fn log_performance_started(conversation_id: &str, scene: &str) {
    info!(
        conversation_id = conversation_id,
        scene = scene,
        "Performance started"
    );
}

/// Log a scene transition
pub fn log_scene_transition(conversation_id: &str, from: &str, to: &str, suppress_prompt: bool) {
    debug!(
        conversation_id = conversation_id,
        from = from,
        to = to,
        suppress_prompt = suppress_prompt,
        "Scene transition"
    );
}

/// Log the end of a flow
pub fn log_performance_finished(conversation_id: &str, scene: &str, reason: &str) {
    if reason == "finished" {
        info!(
            conversation_id = conversation_id,
            scene = scene,
            reason = reason,
            "Performance ended"
        );
    } else {
        warn!(
            conversation_id = conversation_id,
            scene = scene,
            reason = reason,
            "Performance ended"
        );
    }
}

/// Log errors reported by the signal daemon
pub fn log_bus_error(operation: &str, error: &str, conversation_id: Option<&str>) {
    error!(
        operation = operation,
        error = error,
        conversation_id = conversation_id,
        "Bus error occurred"
    );
}
