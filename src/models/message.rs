//! Received message model

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use super::conversation::SignalConversation;

/// The author of a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Author {
    pub id: String,
}

/// A message received from the signal daemon
#[derive(Debug, Clone)]
pub struct Message {
    pub timestamp: DateTime<Utc>,
    pub author: Author,
    pub conversation: Arc<SignalConversation>,
    /// Absolute paths of attachments downloaded by the daemon
    pub attachments: Vec<String>,
    pub content: String,
}

impl Message {
    /// Build a message from the raw values of a `MessageReceived` signal.
    ///
    /// `timestamp_ms` is milliseconds since the Unix epoch; out-of-range values
    /// fall back to the current time.
    pub fn new(
        timestamp_ms: i64,
        author_id: impl Into<String>,
        conversation: Arc<SignalConversation>,
        attachments: Vec<String>,
        content: Option<String>,
    ) -> Self {
        let timestamp = Utc
            .timestamp_millis_opt(timestamp_ms)
            .single()
            .unwrap_or_else(Utc::now);

        Self {
            timestamp,
            author: Author { id: author_id.into() },
            conversation,
            attachments,
            content: content.unwrap_or_default(),
        }
    }

    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }
}
