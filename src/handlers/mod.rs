//! Bot handlers module
//!
//! This module contains the bot's message handling:
//! - Message handlers routing received messages into flows
//! - Flow definitions built from scenes

pub mod flows;
pub mod messages;

// Re-export commonly used handler functions
pub use flows::registration_flow;
pub use messages::{handle_message, run_event_loop};
