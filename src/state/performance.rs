//! Live flow instances
//!
//! A [`Performance`] is the running instance of a flow for one conversation:
//! the scene it is currently on, the state bag its handlers share across
//! turns, and the conversation prompts are sent to.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Conversation;
use crate::utils::errors::{SignalBotError, Result};

/// Open key/value store owned by the scene handlers of one performance.
///
/// Each scene documents the keys it writes; the manager never reads them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneState {
    data: HashMap<String, serde_json::Value>,
}

impl SceneState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value under `key`, replacing any previous value
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> Result<()> {
        let json_value = serde_json::to_value(value)?;
        self.data.insert(key.to_string(), json_value);
        Ok(())
    }

    /// Read the value under `key`, failing if it has a different shape
    pub fn get<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Result<Option<T>> {
        match self.data.get(key) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    /// Read the value under `key`, failing if it is missing
    pub fn require<T: for<'de> Deserialize<'de>>(&self, key: &str) -> Result<T> {
        self.get(key)?.ok_or_else(|| {
            SignalBotError::InvalidInput(format!("Missing required state: {}", key))
        })
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.get::<String>(key).unwrap_or(None)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get::<i64>(key).unwrap_or(None)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get::<bool>(key).unwrap_or(None)
    }

    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.data.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn keys(&self) -> Vec<&String> {
        self.data.keys().collect()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// The live instance of a flow bound to one conversation
pub struct Performance {
    pub(crate) scene: String,
    pub(crate) state: SceneState,
    pub(crate) conversation: Arc<dyn Conversation>,
    pub(crate) started_at: DateTime<Utc>,
    pub(crate) last_activity: DateTime<Utc>,
}

impl Performance {
    pub fn new(scene: impl Into<String>, conversation: Arc<dyn Conversation>, now: DateTime<Utc>) -> Self {
        Self {
            scene: scene.into(),
            state: SceneState::new(),
            conversation,
            started_at: now,
            last_activity: now,
        }
    }

    /// Name of the current scene
    pub fn scene(&self) -> &str {
        &self.scene
    }

    pub fn state(&self) -> &SceneState {
        &self.state
    }

    pub fn conversation_id(&self) -> &str {
        self.conversation.id()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    /// Record activity at `now`
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity = now;
    }

    /// Check if the performance has been idle for longer than `ttl`
    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now - self.last_activity > ttl
    }

    pub(crate) fn send(&self, text: &str) {
        self.conversation.send_message(text);
    }

    pub fn snapshot(&self) -> PerformanceSnapshot {
        PerformanceSnapshot {
            conversation_id: self.conversation.id().to_string(),
            scene: self.scene.clone(),
            state: self.state.clone(),
            started_at: self.started_at,
            last_activity: self.last_activity,
        }
    }
}

impl fmt::Debug for Performance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Performance")
            .field("conversation_id", &self.conversation.id())
            .field("scene", &self.scene)
            .field("state_keys", &self.state.keys())
            .field("last_activity", &self.last_activity)
            .finish_non_exhaustive()
    }
}

/// Point-in-time copy of a performance for logging and inspection
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceSnapshot {
    pub conversation_id: String,
    pub scene: String,
    pub state: SceneState,
    pub started_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Silent;

    impl Conversation for Silent {
        fn id(&self) -> &str {
            "+1555"
        }

        fn send_message(&self, _text: &str) {}
    }

    #[test]
    fn test_state_operations() {
        let mut state = SceneState::new();

        state.set("name", "Alice").unwrap();
        state.set("age", 30).unwrap();
        state.set("confirmed", true).unwrap();

        assert_eq!(state.get_string("name"), Some("Alice".to_string()));
        assert_eq!(state.get_i64("age"), Some(30));
        assert_eq!(state.get_bool("confirmed"), Some(true));
        assert_eq!(state.get_string("missing"), None);
        assert_eq!(state.len(), 3);

        state.remove("age");
        assert!(!state.contains("age"));
        assert!(state.require::<i64>("age").is_err());
        assert_eq!(state.require::<String>("name").unwrap(), "Alice");
    }

    #[test]
    fn test_mismatched_type_is_an_error() {
        let mut state = SceneState::new();
        state.set("age", "thirty").unwrap();

        assert!(state.get::<i64>("age").is_err());
        assert_eq!(state.get_i64("age"), None);
    }

    #[test]
    fn test_expiry() {
        let start = Utc::now();
        let mut performance = Performance::new("name", Arc::new(Silent), start);
        let ttl = Duration::minutes(15);

        assert!(!performance.is_expired(ttl, start + Duration::minutes(10)));
        assert!(performance.is_expired(ttl, start + Duration::minutes(16)));

        performance.touch(start + Duration::minutes(10));
        assert!(!performance.is_expired(ttl, start + Duration::minutes(16)));
        assert_eq!(performance.started_at(), start);
    }

    #[test]
    fn test_snapshot() {
        let now = Utc::now();
        let mut performance = Performance::new("name", Arc::new(Silent), now);
        performance.state.set("name", "Bob").unwrap();

        let snapshot = performance.snapshot();
        assert_eq!(snapshot.conversation_id, "+1555");
        assert_eq!(snapshot.scene, "name");
        assert_eq!(snapshot.state.get_string("name"), Some("Bob".to_string()));
    }
}
