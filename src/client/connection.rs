//! Signal bot client
//!
//! Connects to the daemon through a [`SignalBus`] and runs three tasks:
//! the signal pump turning raw bus signals into [`ClientEvent`]s, the
//! connection check probing the daemon on an interval, and the outbound
//! dispatcher delivering messages queued by conversation handles. When the
//! connection is lost all three stop until the next [`Client::connect`].

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use tokio::sync::{mpsc, Mutex};
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, info, warn};

use crate::config::{Settings, SignalConfig};
use crate::config::validation::validate_signal_config;
use crate::models::{ConversationKind, Message, OutboundMessage};
use crate::utils::errors::{SignalBotError, Result};
use crate::utils::logging::log_bus_error;
use super::bus::{BusEndpoint, BusSignal, SignalBus};
use super::conversations::ConversationManager;

/// Events emitted by a connected client
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// A message was received
    Message(Message),
    /// The daemon or a delivery reported an error
    Error(String),
    /// The connection was lost; call [`Client::connect`] again to reconnect
    Disconnect,
}

/// The account the client is running as
#[derive(Clone)]
pub struct ClientUser {
    bus: Arc<dyn SignalBus>,
}

impl ClientUser {
    /// Check if the account is registered with the daemon.
    /// Should always be `true` on a working connection.
    pub async fn registration_status(&self) -> Result<bool> {
        self.bus.is_registered().await
    }
}

/// Signal bot client
pub struct Client {
    settings: SignalConfig,
    debug: bool,
    bus: Arc<dyn SignalBus>,
    user: ClientUser,
    conversations: Arc<ConversationManager>,
    outbound: Arc<Mutex<mpsc::UnboundedReceiver<OutboundMessage>>>,
    connected: Arc<AtomicBool>,
    tasks: Vec<JoinHandle<()>>,
}

impl Client {
    /// Create a client; fails on invalid signal settings
    pub fn new(settings: &Settings, bus: Arc<dyn SignalBus>) -> Result<Self> {
        validate_signal_config(&settings.signal)?;

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        Ok(Self {
            settings: settings.signal.clone(),
            debug: settings.debug,
            user: ClientUser { bus: bus.clone() },
            bus,
            conversations: Arc::new(ConversationManager::new(outbound_tx)),
            outbound: Arc::new(Mutex::new(outbound_rx)),
            connected: Arc::new(AtomicBool::new(false)),
            tasks: Vec::new(),
        })
    }

    pub fn user(&self) -> &ClientUser {
        &self.user
    }

    pub fn conversations(&self) -> &Arc<ConversationManager> {
        &self.conversations
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Connect to the daemon and start the client tasks.
    ///
    /// Returns the event stream. Calling it again after a
    /// [`ClientEvent::Disconnect`] reconnects.
    pub async fn connect(&mut self) -> Result<mpsc::UnboundedReceiver<ClientEvent>> {
        self.stop_tasks();

        let endpoint = BusEndpoint::from_config(&self.settings);
        info!(
            destination = %endpoint.destination,
            object_path = %endpoint.object_path,
            bus_type = ?endpoint.bus_type,
            "Connecting to signal daemon"
        );

        let signals = self.bus.connect(&endpoint).await?;
        self.connected.store(true, Ordering::SeqCst);

        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let pump = self.spawn_signal_pump(signals, events_tx.clone());
        let dispatcher = self.spawn_outbound_dispatcher(events_tx.clone());
        let check = self.spawn_connection_check(events_tx, vec![pump.abort_handle(), dispatcher.abort_handle()]);
        self.tasks.extend([pump, dispatcher, check]);

        info!("Connected to signal daemon");
        Ok(events_rx)
    }

    /// Stop the client tasks and close the connection
    pub async fn shutdown(&mut self) {
        self.stop_tasks();
        if self.connected.swap(false, Ordering::SeqCst) {
            self.bus.disconnect().await;
        }
        info!("Signal client shut down");
    }

    fn stop_tasks(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }

    fn spawn_signal_pump(
        &self,
        mut signals: mpsc::UnboundedReceiver<BusSignal>,
        events: mpsc::UnboundedSender<ClientEvent>,
    ) -> JoinHandle<()> {
        let conversations = self.conversations.clone();
        let connected = self.connected.clone();
        let debug_signals = self.debug;

        tokio::spawn(async move {
            while let Some(signal) = signals.recv().await {
                match signal {
                    BusSignal::MessageReceived { timestamp, author, group_id, content, attachments } => {
                        if debug_signals {
                            debug!(
                                timestamp = timestamp,
                                author = %author,
                                group_id = %BASE64.encode(&group_id),
                                content = %content,
                                attachments = ?attachments,
                                "MessageReceived"
                            );
                        }

                        let (conversation_id, kind) = if group_id.is_empty() {
                            (author.clone(), ConversationKind::User)
                        } else {
                            (BASE64.encode(&group_id), ConversationKind::Group)
                        };
                        let conversation = conversations.get_or_create(&conversation_id, kind);
                        let message = Message::new(timestamp, author, conversation, attachments, Some(content));

                        if events.send(ClientEvent::Message(message)).is_err() {
                            break;
                        }
                    }
                    BusSignal::Error(error) => {
                        log_bus_error("signal", &error, None);
                        let _ = events.send(ClientEvent::Error(error));
                    }
                }
            }

            if connected.swap(false, Ordering::SeqCst) {
                warn!("Signal stream closed");
                let _ = events.send(ClientEvent::Disconnect);
            }
        })
    }

    /// Probe the daemon on an interval. Once the connection is lost, stops
    /// `client_tasks` before reporting the disconnect; queued outbound
    /// messages wait for the next [`connect`](Self::connect).
    fn spawn_connection_check(
        &self,
        events: mpsc::UnboundedSender<ClientEvent>,
        client_tasks: Vec<AbortHandle>,
    ) -> JoinHandle<()> {
        let bus = self.bus.clone();
        let connected = self.connected.clone();
        let interval = self.settings.connection_check_interval();
        let debug_signals = self.debug;

        tokio::spawn(async move {
            let stop_client_tasks = || {
                for task in &client_tasks {
                    task.abort();
                }
            };

            let mut ticker = tokio::time::interval(interval);
            // the first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;

                // the signal pump saw the stream close
                if !connected.load(Ordering::SeqCst) {
                    break;
                }

                match bus.is_registered().await {
                    Ok(true) => {}
                    Ok(false) => warn!("Daemon reports the account as not registered"),
                    Err(e) => {
                        if debug_signals {
                            debug!(error = %e, "Disconnect");
                        }
                        if connected.swap(false, Ordering::SeqCst) {
                            stop_client_tasks();
                            bus.disconnect().await;
                            warn!(error = %e, "Lost connection to signal daemon");
                            let _ = events.send(ClientEvent::Disconnect);
                        }
                        break;
                    }
                }
            }

            stop_client_tasks();
        })
    }

    fn spawn_outbound_dispatcher(&self, events: mpsc::UnboundedSender<ClientEvent>) -> JoinHandle<()> {
        let bus = self.bus.clone();
        let outbound = self.outbound.clone();

        tokio::spawn(async move {
            let mut queue = outbound.lock().await;

            while let Some(message) = queue.recv().await {
                if let Err(e) = deliver(bus.as_ref(), &message).await {
                    log_bus_error("send_message", &e.to_string(), Some(&message.conversation_id));
                    let _ = events.send(ClientEvent::Error(e.to_string()));
                }
            }
        })
    }
}

async fn deliver(bus: &dyn SignalBus, message: &OutboundMessage) -> Result<()> {
    match message.kind {
        ConversationKind::User => bus.send_message(&message.conversation_id, &message.text).await,
        ConversationKind::Group => {
            let group_id = BASE64.decode(&message.conversation_id).map_err(|e| {
                SignalBotError::InvalidInput(format!("Invalid group ID {}: {}", message.conversation_id, e))
            })?;
            bus.send_group_message(&group_id, &message.text).await
        }
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.stop_tasks();
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("settings", &self.settings)
            .field("debug", &self.debug)
            .field("connected", &self.is_connected())
            .field("conversations", &self.conversations.len())
            .finish_non_exhaustive()
    }
}
