//! Conversation flows shipped with the bot

pub mod registration;

pub use registration::registration_flow;
