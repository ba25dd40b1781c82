//! Message handlers module
//!
//! Routes received messages into the conversation flows and runs the client
//! event loop.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, debug, warn, error};

use crate::client::ClientEvent;
use crate::models::{Conversation, Message};
use crate::state::{PerformOutcome, SceneManager};
use crate::utils::errors::Result;

/// Handle an incoming text message.
///
/// Failures confined to one conversation are logged and swallowed; the flow
/// of that conversation has already been dropped by the manager.
/// Configuration errors are returned.
pub fn handle_message(
    message: &Message,
    scenes: &SceneManager,
    start_trigger: Option<&str>,
) -> Result<()> {
    let conversation_id = message.conversation.id();

    debug!(
        conversation_id = conversation_id,
        author = %message.author.id,
        attachments = message.attachments.len(),
        "Processing message"
    );

    match scenes.perform(start_trigger, message.conversation.clone(), &message.content) {
        Ok(PerformOutcome::Unhandled) => {
            debug!(conversation_id = conversation_id, "Message did not match any flow");
            Ok(())
        }
        Ok(outcome) => {
            debug!(conversation_id = conversation_id, outcome = ?outcome, "Message routed");
            Ok(())
        }
        Err(e) if e.is_configuration() => Err(e),
        Err(e) => {
            error!(
                conversation_id = conversation_id,
                error = %e,
                severity = %e.severity(),
                "Flow failed for conversation"
            );
            Ok(())
        }
    }
}

/// Consume client events until the client disconnects or the stream ends
pub async fn run_event_loop(
    mut events: mpsc::UnboundedReceiver<ClientEvent>,
    scenes: Arc<SceneManager>,
    start_trigger: Option<String>,
) -> Result<()> {
    while let Some(event) = events.recv().await {
        match event {
            ClientEvent::Message(message) => {
                handle_message(&message, &scenes, start_trigger.as_deref())?;
            }
            ClientEvent::Error(e) => {
                warn!(error = %e, "Client reported an error");
            }
            ClientEvent::Disconnect => {
                warn!("Client disconnected, stopping event loop");
                return Ok(());
            }
        }
    }

    info!("Event stream closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use crate::models::{ConversationKind, OutboundMessage, SignalConversation};
    use crate::state::Scene;
    use crate::utils::errors::SignalBotError;

    const START: &str = "/start";

    /// Echoes replies; `boom` fails the handler, `jump` transitions to a missing scene
    fn fragile_flow() -> SceneManager {
        let mut manager = SceneManager::new().add_scene(Scene::from_fn("echo", "Say something", |reply, ctx| {
            match reply {
                "boom" => return Err(SignalBotError::handler("echo", "exploded")),
                "jump" => ctx.next("missing"),
                _ => ctx.reply(format!("echo {}", reply)),
            }
            Ok(())
        }));
        manager.verify().unwrap();
        manager
    }

    fn message(outbound: &mpsc::UnboundedSender<OutboundMessage>, author: &str, content: &str) -> Message {
        let conversation = Arc::new(SignalConversation::new(author, ConversationKind::User, outbound.clone()));
        Message::new(1_640_995_200_000, author, conversation, Vec::new(), Some(content.to_string()))
    }

    fn drain(outbound: &mut mpsc::UnboundedReceiver<OutboundMessage>, conversation_id: &str) -> Vec<String> {
        let mut texts = Vec::new();
        while let Ok(message) = outbound.try_recv() {
            if message.conversation_id == conversation_id {
                texts.push(message.text);
            }
        }
        texts
    }

    #[test]
    fn test_flow_failures_are_confined_to_their_conversation() {
        let scenes = fragile_flow();
        let (tx, mut rx) = mpsc::unbounded_channel();

        for author in ["+1", "+2", "+3"] {
            handle_message(&message(&tx, author, START), &scenes, Some(START)).unwrap();
        }

        assert!(handle_message(&message(&tx, "+1", "boom"), &scenes, Some(START)).is_ok());
        assert!(handle_message(&message(&tx, "+2", "jump"), &scenes, Some(START)).is_ok());

        assert!(!scenes.has_performance("+1"));
        assert!(!scenes.has_performance("+2"));
        assert!(scenes.has_performance("+3"));

        handle_message(&message(&tx, "+3", "hi"), &scenes, Some(START)).unwrap();
        assert_eq!(drain(&mut rx, "+3"), vec!["Say something", "echo hi"]);
    }

    #[test]
    fn test_unverified_manager_is_a_configuration_error() {
        let scenes = SceneManager::new().add_scene(Scene::from_fn("echo", "Say something", |_reply, _ctx| Ok(())));
        let (tx, _rx) = mpsc::unbounded_channel();

        assert_matches!(
            handle_message(&message(&tx, "+1", START), &scenes, Some(START)),
            Err(SignalBotError::NotVerified)
        );
    }

    #[tokio::test]
    async fn test_event_loop_keeps_serving_after_a_flow_fails() {
        let scenes = Arc::new(fragile_flow());
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        for (author, content) in [("+1", START), ("+2", START), ("+1", "boom"), ("+2", "hi")] {
            events_tx.send(ClientEvent::Message(message(&outbound_tx, author, content))).unwrap();
        }
        events_tx.send(ClientEvent::Error("daemon hiccup".to_string())).unwrap();
        events_tx.send(ClientEvent::Message(message(&outbound_tx, "+2", "again"))).unwrap();
        drop(events_tx);

        run_event_loop(events_rx, scenes.clone(), Some(START.to_string())).await.unwrap();

        assert!(!scenes.has_performance("+1"));
        assert_eq!(
            drain(&mut outbound_rx, "+2"),
            vec!["Say something", "echo hi", "echo again"]
        );
    }

    #[tokio::test]
    async fn test_event_loop_stops_on_configuration_error() {
        let scenes = Arc::new(SceneManager::new().add_scene(Scene::from_fn("echo", "Say something", |_reply, _ctx| Ok(()))));
        let (outbound_tx, _outbound_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        events_tx.send(ClientEvent::Message(message(&outbound_tx, "+1", START))).unwrap();
        events_tx.send(ClientEvent::Message(message(&outbound_tx, "+2", START))).unwrap();

        let result = run_event_loop(events_rx, scenes, Some(START.to_string())).await;

        assert_matches!(result, Err(SignalBotError::NotVerified));
    }

    #[tokio::test]
    async fn test_event_loop_ends_on_disconnect() {
        let scenes = Arc::new(fragile_flow());
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        events_tx.send(ClientEvent::Disconnect).unwrap();

        assert!(run_event_loop(events_rx, scenes, None).await.is_ok());
        assert!(events_tx.is_closed());
    }
}
