//! Scene manager
//!
//! Owns the registered scenes and the table of live performances, and routes
//! every inbound reply:
//!
//! 1. a conversation with a live performance has the reply handed to the
//!    handler of its current scene;
//! 2. otherwise a reply equal (after trimming) to the start trigger starts a
//!    new performance on the first registered scene and sends its prompt;
//! 3. anything else is reported as [`PerformOutcome::Unhandled`] and has no
//!    side effect.
//!
//! The performance table sits behind one routing lock, so a reply is fully
//! routed before the next one is looked at.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::models::Conversation;
use crate::utils::errors::{SignalBotError, Result};
use crate::utils::logging::{log_performance_finished, log_performance_started, log_scene_transition};
use super::context::{SceneAction, SceneContext};
use super::performance::{Performance, PerformanceSnapshot};
use super::scene::Scene;

/// What routing a reply did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PerformOutcome {
    /// Blank reply, nothing happened
    Ignored,
    /// No live flow and the reply is not the start trigger
    Unhandled,
    /// A new flow started on `scene`
    Started { scene: String },
    /// The reply was handled and the flow is now on `scene`
    Continued { scene: String },
    /// The handler ended the flow
    Finished,
}

type PerformanceTable = HashMap<String, Performance>;

/// Scene registry and per-conversation flow router
#[derive(Debug)]
pub struct SceneManager {
    scenes: Vec<Scene>,
    performances: Mutex<PerformanceTable>,
    valid: bool,
    performance_ttl: Option<Duration>,
}

impl SceneManager {
    pub fn new() -> Self {
        Self {
            scenes: Vec::new(),
            performances: Mutex::new(HashMap::new()),
            valid: false,
            performance_ttl: None,
        }
    }

    /// Register a scene. The first registered scene is the entry scene.
    ///
    /// Names are only checked by [`verify`](Self::verify); adding a scene
    /// clears a previous successful verification.
    pub fn add_scene(mut self, scene: Scene) -> Self {
        self.scenes.push(scene);
        self.valid = false;
        self
    }

    /// Drop performances idle for longer than `ttl` on [`sweep_expired`](Self::sweep_expired)
    pub fn with_performance_ttl(mut self, ttl: Duration) -> Self {
        self.performance_ttl = Some(ttl);
        self
    }

    /// Check the registry. Must succeed before any call to [`perform`](Self::perform).
    pub fn verify(&mut self) -> Result<()> {
        if self.scenes.is_empty() {
            return Err(SignalBotError::NoScenesRegistered);
        }

        let mut seen = HashSet::new();
        for scene in &self.scenes {
            if !seen.insert(scene.name()) {
                return Err(SignalBotError::DuplicateScene {
                    name: scene.name().to_string(),
                });
            }
        }

        self.valid = true;
        debug!(scenes = self.scenes.len(), "Scene manager verified");
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn get_scene(&self, name: &str) -> Option<&Scene> {
        self.scenes.iter().find(|scene| scene.name() == name)
    }

    pub fn performance_ttl(&self) -> Option<Duration> {
        self.performance_ttl
    }

    /// Route one inbound reply for `conversation`
    pub fn perform(
        &self,
        start_trigger: Option<&str>,
        conversation: Arc<dyn Conversation>,
        reply: &str,
    ) -> Result<PerformOutcome> {
        self.perform_at(start_trigger, conversation, reply, Utc::now())
    }

    /// [`perform`](Self::perform) with an explicit clock
    pub fn perform_at(
        &self,
        start_trigger: Option<&str>,
        conversation: Arc<dyn Conversation>,
        reply: &str,
        now: DateTime<Utc>,
    ) -> Result<PerformOutcome> {
        if !self.valid {
            return Err(SignalBotError::NotVerified);
        }

        let trimmed = reply.trim();
        if trimmed.is_empty() {
            return Ok(PerformOutcome::Ignored);
        }

        let conversation_id = conversation.id().to_string();
        debug!(conversation_id = %conversation_id, reply = reply, "Routing reply");

        let mut performances = self.lock()?;

        if performances.contains_key(&conversation_id) {
            return self.continue_performance(&mut performances, &conversation_id, reply, now);
        }

        if start_trigger.map_or(false, |trigger| trigger == trimmed) {
            return self.start_performance(&mut performances, &conversation_id, conversation, now);
        }

        debug!(conversation_id = %conversation_id, "Reply ignored, no active performance");
        Ok(PerformOutcome::Unhandled)
    }

    fn start_performance(
        &self,
        performances: &mut PerformanceTable,
        conversation_id: &str,
        conversation: Arc<dyn Conversation>,
        now: DateTime<Utc>,
    ) -> Result<PerformOutcome> {
        let entry = self.scenes.first().ok_or(SignalBotError::NoScenesRegistered)?;

        let performance = Performance::new(entry.name(), conversation, now);
        self.execute_scene(&performance, false)?;
        performances.insert(conversation_id.to_string(), performance);

        log_performance_started(conversation_id, entry.name());
        Ok(PerformOutcome::Started {
            scene: entry.name().to_string(),
        })
    }

    fn continue_performance(
        &self,
        performances: &mut PerformanceTable,
        conversation_id: &str,
        reply: &str,
        now: DateTime<Utc>,
    ) -> Result<PerformOutcome> {
        let Some(performance) = performances.get_mut(conversation_id) else {
            return Ok(PerformOutcome::Unhandled);
        };

        let scene_name = performance.scene.clone();
        let Some(scene) = self.get_scene(&scene_name) else {
            self.drop_performance(performances, conversation_id, "unknown scene");
            return Err(SignalBotError::UnknownScene { name: scene_name });
        };

        performance.touch(now);
        let mut ctx = SceneContext::new(conversation_id, &mut performance.state);
        let result = scene.handle_reply(reply, &mut ctx);
        let actions = ctx.into_actions();

        if let Err(e) = result {
            self.drop_performance(performances, conversation_id, "handler error");
            return Err(match e {
                SignalBotError::Handler { .. } => e,
                other => SignalBotError::handler(scene_name, other),
            });
        }

        self.apply_actions(performances, conversation_id, actions)
    }

    fn apply_actions(
        &self,
        performances: &mut PerformanceTable,
        conversation_id: &str,
        actions: Vec<SceneAction>,
    ) -> Result<PerformOutcome> {
        let mut finished = false;

        for action in actions {
            if finished {
                warn!(conversation_id = conversation_id, action = ?action, "Discarding action recorded after finish");
                continue;
            }

            match action {
                SceneAction::Reply(text) => {
                    if let Some(performance) = performances.get(conversation_id) {
                        performance.send(&text);
                    }
                }
                SceneAction::Transition { scene, suppress_prompt } => {
                    if self.get_scene(&scene).is_none() {
                        self.drop_performance(performances, conversation_id, "transition to unknown scene");
                        return Err(SignalBotError::UnknownScene { name: scene });
                    }

                    if let Some(performance) = performances.get_mut(conversation_id) {
                        log_scene_transition(conversation_id, &performance.scene, &scene, suppress_prompt);
                        performance.scene = scene;
                        self.execute_scene(performance, suppress_prompt)?;
                    }
                }
                SceneAction::Finish(message) => {
                    if let Some(performance) = performances.remove(conversation_id) {
                        if let Some(text) = message {
                            performance.send(&text);
                        }
                        log_performance_finished(conversation_id, &performance.scene, "finished");
                    }
                    finished = true;
                }
            }
        }

        if finished {
            return Ok(PerformOutcome::Finished);
        }

        let scene = performances
            .get(conversation_id)
            .map(|performance| performance.scene.clone())
            .unwrap_or_default();
        Ok(PerformOutcome::Continued { scene })
    }

    /// Send the prompt of the performance's current scene unless suppressed.
    /// Never calls the scene's handler.
    fn execute_scene(&self, performance: &Performance, no_message: bool) -> Result<()> {
        let scene = self.get_scene(&performance.scene).ok_or_else(|| {
            SignalBotError::UnknownScene {
                name: performance.scene.clone(),
            }
        })?;

        if !no_message {
            performance.send(scene.message());
        }

        Ok(())
    }

    fn drop_performance(&self, performances: &mut PerformanceTable, conversation_id: &str, reason: &str) {
        if let Some(performance) = performances.remove(conversation_id) {
            log_performance_finished(conversation_id, &performance.scene, reason);
        }
    }

    /// End the flow of a conversation without sending anything
    pub fn cancel(&self, conversation_id: &str) -> Result<bool> {
        let mut performances = self.lock()?;
        let removed = performances.contains_key(conversation_id);
        self.drop_performance(&mut performances, conversation_id, "cancelled");
        Ok(removed)
    }

    /// Drop performances idle for longer than the configured TTL.
    /// Returns the number of dropped performances.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let Some(ttl) = self.performance_ttl else {
            return Ok(0);
        };

        let mut performances = self.lock()?;
        let expired: Vec<String> = performances
            .iter()
            .filter(|(_, performance)| performance.is_expired(ttl, now))
            .map(|(id, _)| id.clone())
            .collect();

        for conversation_id in &expired {
            self.drop_performance(&mut performances, conversation_id, "expired");
        }

        Ok(expired.len())
    }

    pub fn has_performance(&self, conversation_id: &str) -> bool {
        self.lock()
            .map(|performances| performances.contains_key(conversation_id))
            .unwrap_or(false)
    }

    pub fn active_performances(&self) -> usize {
        self.lock().map(|performances| performances.len()).unwrap_or(0)
    }

    /// Name of the scene a conversation is currently on
    pub fn current_scene(&self, conversation_id: &str) -> Option<String> {
        self.snapshot(conversation_id).map(|snapshot| snapshot.scene)
    }

    pub fn snapshot(&self, conversation_id: &str) -> Option<PerformanceSnapshot> {
        self.lock()
            .ok()?
            .get(conversation_id)
            .map(Performance::snapshot)
    }

    fn lock(&self) -> Result<MutexGuard<'_, PerformanceTable>> {
        self.performances
            .lock()
            .map_err(|e| SignalBotError::LockPoisoned(e.to_string()))
    }
}

impl Default for SceneManager {
    fn default() -> Self {
        Self::new()
    }
}
