//! Reply-dispatch context
//!
//! The context handed to a scene handler. It exposes the conversation ID, the
//! live state bag, and three flow operations. The operations are recorded as
//! [`SceneAction`]s and applied by the manager, in order, once the handler
//! returns.

use serde::Serialize;

use super::performance::SceneState;

/// A flow operation requested by a scene handler
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SceneAction {
    /// Move to another scene, sending its prompt unless suppressed
    Transition { scene: String, suppress_prompt: bool },
    /// Send a message without leaving the current scene
    Reply(String),
    /// Send an optional closing message and end the flow
    Finish(Option<String>),
}

/// Capabilities available to a scene handler for one reply
#[derive(Debug)]
pub struct SceneContext<'a> {
    user: &'a str,
    state: &'a mut SceneState,
    actions: Vec<SceneAction>,
}

impl<'a> SceneContext<'a> {
    pub fn new(user: &'a str, state: &'a mut SceneState) -> Self {
        Self {
            user,
            state,
            actions: Vec::new(),
        }
    }

    /// Conversation ID the reply came from
    pub fn user(&self) -> &str {
        self.user
    }

    pub fn state(&self) -> &SceneState {
        &*self.state
    }

    pub fn state_mut(&mut self) -> &mut SceneState {
        &mut *self.state
    }

    /// Transition to `scene` and send its prompt
    pub fn next(&mut self, scene: impl Into<String>) {
        self.next_with(scene, false);
    }

    /// Transition to `scene` without sending its prompt
    pub fn next_silent(&mut self, scene: impl Into<String>) {
        self.next_with(scene, true);
    }

    pub fn next_with(&mut self, scene: impl Into<String>, no_message: bool) {
        self.actions.push(SceneAction::Transition {
            scene: scene.into(),
            suppress_prompt: no_message,
        });
    }

    /// Send a message, staying on the current scene
    pub fn reply(&mut self, message: impl Into<String>) {
        self.actions.push(SceneAction::Reply(message.into()));
    }

    /// End the flow silently
    pub fn finish(&mut self) {
        self.actions.push(SceneAction::Finish(None));
    }

    /// Send `message`, then end the flow
    pub fn finish_with(&mut self, message: impl Into<String>) {
        self.actions.push(SceneAction::Finish(Some(message.into())));
    }

    /// Actions recorded so far
    pub fn actions(&self) -> &[SceneAction] {
        &self.actions
    }

    pub fn into_actions(self) -> Vec<SceneAction> {
        self.actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actions_are_recorded_in_order() {
        let mut state = SceneState::new();
        let mut ctx = SceneContext::new("+1555", &mut state);

        ctx.reply("Invalid age");
        ctx.next("age");
        ctx.next_silent("summary");
        ctx.finish_with("Thanks!");

        assert_eq!(ctx.user(), "+1555");
        assert_eq!(
            ctx.into_actions(),
            vec![
                SceneAction::Reply("Invalid age".to_string()),
                SceneAction::Transition { scene: "age".to_string(), suppress_prompt: false },
                SceneAction::Transition { scene: "summary".to_string(), suppress_prompt: true },
                SceneAction::Finish(Some("Thanks!".to_string())),
            ]
        );
    }

    #[test]
    fn test_state_writes_are_live() {
        let mut state = SceneState::new();
        {
            let mut ctx = SceneContext::new("+1555", &mut state);
            ctx.state_mut().set("count", 2).unwrap();
            assert_eq!(ctx.state().get_i64("count"), Some(2));
            ctx.finish();
        }
        assert_eq!(state.get_i64("count"), Some(2));
    }
}
