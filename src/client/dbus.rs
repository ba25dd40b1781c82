//! D-Bus bus
//!
//! [`SignalBus`] implementation talking to the signal-cli daemon over the
//! system or session bus.

use std::sync::Mutex;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use zbus::{Connection, Proxy};

use crate::config::BusType;
use crate::utils::errors::{SignalBotError, Result};
use super::bus::{BusEndpoint, BusSignal, SignalBus, SIGNAL_INTERFACE};

/// `MessageReceived(x timestamp, s sender, ay groupId, s message, as attachments)`
type MessageReceivedArgs = (i64, String, Vec<u8>, String, Vec<String>);

/// signal-cli daemon reached over D-Bus
#[derive(Debug, Default)]
pub struct DbusBus {
    proxy: Mutex<Option<Proxy<'static>>>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl DbusBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn proxy(&self) -> Result<Proxy<'static>> {
        self.proxy
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .ok_or(SignalBotError::Disconnected)
    }

    fn set_reader(&self, handle: Option<JoinHandle<()>>) {
        let mut reader = self.reader.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = reader.take() {
            previous.abort();
        }
        *reader = handle;
    }
}

#[async_trait]
impl SignalBus for DbusBus {
    async fn connect(&self, endpoint: &BusEndpoint) -> Result<mpsc::UnboundedReceiver<BusSignal>> {
        let connection = match endpoint.bus_type {
            BusType::System => Connection::system().await?,
            BusType::Session => Connection::session().await?,
        };

        let proxy = Proxy::new(
            &connection,
            endpoint.destination.clone(),
            endpoint.object_path.clone(),
            SIGNAL_INTERFACE,
        )
        .await?;

        let stream = proxy.receive_signal("MessageReceived").await?;
        let (tx, rx) = mpsc::unbounded_channel();

        let handle = tokio::spawn(async move {
            futures::pin_mut!(stream);

            while let Some(message) = stream.next().await {
                let body = message.body();
                let signal = match body.deserialize::<MessageReceivedArgs>() {
                    Ok((timestamp, author, group_id, content, attachments)) => BusSignal::MessageReceived {
                        timestamp,
                        author,
                        group_id,
                        content,
                        attachments,
                    },
                    Err(e) => BusSignal::Error(format!("Malformed MessageReceived signal: {}", e)),
                };

                if tx.send(signal).is_err() {
                    break;
                }
            }
            debug!("D-Bus signal stream ended");
        });

        *self.proxy.lock().unwrap_or_else(|e| e.into_inner()) = Some(proxy);
        self.set_reader(Some(handle));

        info!(object_path = %endpoint.object_path, "Subscribed to daemon signals");
        Ok(rx)
    }

    async fn is_registered(&self) -> Result<bool> {
        let registered: bool = self.proxy()?.call("isRegistered", &()).await?;
        Ok(registered)
    }

    async fn send_message(&self, recipient: &str, text: &str) -> Result<()> {
        let _timestamp: i64 = self
            .proxy()?
            .call("sendMessage", &(text, Vec::<String>::new(), recipient))
            .await?;
        Ok(())
    }

    async fn send_group_message(&self, group_id: &[u8], text: &str) -> Result<()> {
        let _timestamp: i64 = self
            .proxy()?
            .call("sendGroupMessage", &(text, Vec::<String>::new(), group_id))
            .await?;
        Ok(())
    }

    async fn disconnect(&self) {
        self.set_reader(None);
        self.proxy.lock().unwrap_or_else(|e| e.into_inner()).take();
    }
}
