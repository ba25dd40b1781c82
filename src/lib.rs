//! signal-bot
//!
//! A bot client for the Signal messenger, talking to the signal-cli daemon.
//! Besides receiving and sending messages it drives multi-step conversation
//! flows: each conversation can run through a sequence of scenes that prompt
//! the user, keep per-conversation state, and finish when done.

pub mod config;
pub mod client;
pub mod handlers;
pub mod models;
pub mod state;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{SignalBotError, Result};

// Re-export main components for easy access
pub use client::{Client, ClientEvent, SignalBus};
pub use models::{Conversation, Message};
pub use state::{PerformOutcome, Scene, SceneContext, SceneManager};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
