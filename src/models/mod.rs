//! Data models module
//!
//! This module contains the data structures shared between the signal client
//! and the conversation flow engine.

pub mod conversation;
pub mod message;

pub use conversation::{Conversation, ConversationKind, OutboundMessage, SignalConversation};
pub use message::{Author, Message};
