//! Conversation cache
//!
//! Keeps one shared handle per conversation ID so that every message of a
//! conversation carries the same handle.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tokio::sync::mpsc;
use tracing::debug;

use crate::models::{Conversation, ConversationKind, OutboundMessage, SignalConversation};

/// Cache of conversation handles keyed by conversation ID
#[derive(Debug)]
pub struct ConversationManager {
    cache: RwLock<HashMap<String, Arc<SignalConversation>>>,
    outbound: mpsc::UnboundedSender<OutboundMessage>,
}

impl ConversationManager {
    pub fn new(outbound: mpsc::UnboundedSender<OutboundMessage>) -> Self {
        Self {
            cache: RwLock::new(HashMap::new()),
            outbound,
        }
    }

    /// Build a handle for `id` without caching it
    pub fn from(&self, id: &str, kind: ConversationKind) -> Arc<SignalConversation> {
        Arc::new(SignalConversation::new(id, kind, self.outbound.clone()))
    }

    pub fn add_to_cache(&self, conversation: Arc<SignalConversation>) {
        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        cache.insert(conversation.id().to_string(), conversation);
    }

    pub fn get(&self, id: &str) -> Option<Arc<SignalConversation>> {
        let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
        cache.get(id).cloned()
    }

    /// Return the cached handle for `id`, creating and caching one if needed
    pub fn get_or_create(&self, id: &str, kind: ConversationKind) -> Arc<SignalConversation> {
        if let Some(conversation) = self.get(id) {
            return conversation;
        }

        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        cache
            .entry(id.to_string())
            .or_insert_with(|| {
                debug!(conversation_id = id, kind = ?kind, "Caching new conversation");
                Arc::new(SignalConversation::new(id, kind, self.outbound.clone()))
            })
            .clone()
    }

    /// All cached conversations
    pub fn values(&self) -> Vec<Arc<SignalConversation>> {
        let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
        cache.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.cache.read().map(|cache| cache.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_create_caches_once() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let manager = ConversationManager::new(tx);

        let first = manager.get_or_create("+1555", ConversationKind::User);
        let second = manager.get_or_create("+1555", ConversationKind::User);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_from_does_not_cache() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let manager = ConversationManager::new(tx);

        let conversation = manager.from("group", ConversationKind::Group);
        assert!(manager.get("group").is_none());

        manager.add_to_cache(conversation);
        assert!(manager.get("group").is_some());
        assert_eq!(manager.values().len(), 1);
    }
}
