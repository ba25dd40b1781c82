//! Test helpers module
//!
//! This module provides mocks shared by the integration tests: a conversation
//! that records what the bot sends and an in-memory signal daemon bus.

#![allow(dead_code)]

pub mod bus_mock;
pub mod conversation_mock;

pub use bus_mock::*;
pub use conversation_mock::*;

use signal_bot::config::Settings;

/// Settings with a fast connection check, suitable for tests
pub fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.signal.connection_check_interval_ms = 20;
    settings
}
