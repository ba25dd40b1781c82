//! Conversation handles
//!
//! A conversation is either a direct chat with one user or a group chat.
//! Sending is fire-and-forget: the message is queued for the client's
//! outbound dispatcher and delivery failures are reported there.

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::warn;

/// A conversation the bot can talk to
pub trait Conversation: Send + Sync {
    /// Stable conversation ID (author number or base64 group ID)
    fn id(&self) -> &str;

    /// Queue a text message for this conversation
    fn send_message(&self, text: &str);
}

/// Kind of conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationKind {
    User,
    Group,
}

/// A message waiting to be delivered by the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub conversation_id: String,
    pub kind: ConversationKind,
    pub text: String,
}

/// Conversation backed by the signal client's outbound queue
#[derive(Clone)]
pub struct SignalConversation {
    id: String,
    kind: ConversationKind,
    outbound: mpsc::UnboundedSender<OutboundMessage>,
}

impl SignalConversation {
    pub fn new(
        id: impl Into<String>,
        kind: ConversationKind,
        outbound: mpsc::UnboundedSender<OutboundMessage>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            outbound,
        }
    }

    pub fn kind(&self) -> ConversationKind {
        self.kind
    }

    pub fn is_group(&self) -> bool {
        self.kind == ConversationKind::Group
    }
}

impl Conversation for SignalConversation {
    fn id(&self) -> &str {
        &self.id
    }

    fn send_message(&self, text: &str) {
        let message = OutboundMessage {
            conversation_id: self.id.clone(),
            kind: self.kind,
            text: text.to_string(),
        };

        if self.outbound.send(message).is_err() {
            warn!(conversation_id = %self.id, "Outbound queue closed, message dropped");
        }
    }
}

impl fmt::Debug for SignalConversation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalConversation")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_message_queues_outbound() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let conversation = SignalConversation::new("+15550001111", ConversationKind::User, tx);

        conversation.send_message("Hello");

        let queued = rx.try_recv().unwrap();
        assert_eq!(queued.conversation_id, "+15550001111");
        assert_eq!(queued.kind, ConversationKind::User);
        assert_eq!(queued.text, "Hello");
    }

    #[test]
    fn test_send_after_queue_closed_does_not_panic() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let conversation = SignalConversation::new("group", ConversationKind::Group, tx);

        conversation.send_message("lost");
        assert!(conversation.is_group());
    }
}
