//! Scene definitions
//!
//! A scene is one step of a conversation flow: a name, the prompt sent when
//! the step is entered, and the handler that interprets the replies received
//! while the conversation sits on this step.

use std::fmt;
use std::sync::Arc;

use crate::utils::errors::Result;
use super::context::SceneContext;

/// Interprets replies received while a conversation is on a scene
pub trait SceneHandler: Send + Sync {
    fn on_reply(&self, reply: &str, ctx: &mut SceneContext<'_>) -> Result<()>;
}

impl<F> SceneHandler for F
where
    F: Fn(&str, &mut SceneContext<'_>) -> Result<()> + Send + Sync,
{
    fn on_reply(&self, reply: &str, ctx: &mut SceneContext<'_>) -> Result<()> {
        self(reply, ctx)
    }
}

/// An immutable step definition
#[derive(Clone)]
pub struct Scene {
    name: String,
    message: String,
    handler: Arc<dyn SceneHandler>,
}

impl Scene {
    /// Create a scene from a handler type
    pub fn new(
        name: impl Into<String>,
        message: impl Into<String>,
        handler: impl SceneHandler + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            handler: Arc::new(handler),
        }
    }

    /// Create a scene from a closure
    pub fn from_fn<F>(name: impl Into<String>, message: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&str, &mut SceneContext<'_>) -> Result<()> + Send + Sync + 'static,
    {
        Self::new(name, message, handler)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Prompt sent when the scene is entered
    pub fn message(&self) -> &str {
        &self.message
    }

    pub(crate) fn handle_reply(&self, reply: &str, ctx: &mut SceneContext<'_>) -> Result<()> {
        self.handler.on_reply(reply, ctx)
    }
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("name", &self.name)
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::performance::SceneState;

    struct Echo;

    impl SceneHandler for Echo {
        fn on_reply(&self, reply: &str, ctx: &mut SceneContext<'_>) -> Result<()> {
            ctx.reply(reply);
            Ok(())
        }
    }

    #[test]
    fn test_scene_accessors() {
        let scene = Scene::new("echo", "Say something", Echo);
        assert_eq!(scene.name(), "echo");
        assert_eq!(scene.message(), "Say something");
    }

    #[test]
    fn test_closure_handler() {
        let scene = Scene::from_fn("name", "Name?", |reply, ctx| {
            ctx.state_mut().set("name", reply)?;
            ctx.next("age");
            Ok(())
        });

        let mut state = SceneState::new();
        let mut ctx = SceneContext::new("+1555", &mut state);
        scene.handle_reply("Alice", &mut ctx).unwrap();

        assert_eq!(ctx.actions().len(), 1);
        assert_eq!(state.get_string("name"), Some("Alice".to_string()));
    }
}
