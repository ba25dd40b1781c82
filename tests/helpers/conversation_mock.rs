//! Recording conversation for testing
//!
//! Implements the conversation handle and records every message sent to it.

use std::sync::{Arc, Mutex};

use signal_bot::models::Conversation;

/// Conversation that records outgoing messages
#[derive(Debug)]
pub struct RecordingConversation {
    id: String,
    sent: Mutex<Vec<String>>,
}

impl RecordingConversation {
    pub fn new(id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            sent: Mutex::new(Vec::new()),
        })
    }

    /// All messages sent so far
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last_sent(&self) -> Option<String> {
        self.sent.lock().unwrap().last().cloned()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl Conversation for RecordingConversation {
    fn id(&self) -> &str {
        &self.id
    }

    fn send_message(&self, text: &str) {
        self.sent.lock().unwrap().push(text.to_string());
    }
}
