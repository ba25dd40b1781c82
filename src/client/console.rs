//! Console bus
//!
//! A [`SignalBus`] reading messages from stdin and printing outgoing messages
//! to stdout, for running flows locally without a signal daemon. Every input
//! line is a direct message from one fixed author.

use std::sync::Mutex;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::utils::errors::Result;
use super::bus::{BusEndpoint, BusSignal, SignalBus};

/// Stdin/stdout implementation of [`SignalBus`]
#[derive(Debug)]
pub struct ConsoleBus {
    author: String,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl ConsoleBus {
    pub fn new(author: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            reader: Mutex::new(None),
        }
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
impl SignalBus for ConsoleBus {
    async fn connect(&self, endpoint: &BusEndpoint) -> Result<mpsc::UnboundedReceiver<BusSignal>> {
        info!(object_path = %endpoint.object_path, author = %self.author, "Console bus reading from stdin");

        let (tx, rx) = mpsc::unbounded_channel();
        let author = self.author.clone();

        let handle = tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let signal = BusSignal::MessageReceived {
                            timestamp: Utc::now().timestamp_millis(),
                            author: author.clone(),
                            group_id: Vec::new(),
                            content: line,
                            attachments: Vec::new(),
                        };
                        if tx.send(signal).is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        debug!("Console input closed");
                        break;
                    }
                    Err(e) => {
                        let _ = tx.send(BusSignal::Error(e.to_string()));
                        break;
                    }
                }
            }
        });

        self.set_reader(Some(handle));
        Ok(rx)
    }

    async fn is_registered(&self) -> Result<bool> {
        Ok(true)
    }

    async fn send_message(&self, recipient: &str, text: &str) -> Result<()> {
        println!("[to {}] {}", recipient, text);
        Ok(())
    }

    async fn send_group_message(&self, group_id: &[u8], text: &str) -> Result<()> {
        println!("[to group {}] {}", BASE64.encode(group_id), text);
        Ok(())
    }

    async fn disconnect(&self) {
        self.set_reader(None);
    }
}
