//! Mock signal daemon bus for testing
//!
//! Lets tests inject daemon signals, inspect delivered messages and make the
//! registration check fail.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use signal_bot::client::{BusEndpoint, BusSignal, SignalBus};
use signal_bot::{Result, SignalBotError};

/// In-memory signal bus
#[derive(Debug, Default)]
pub struct MockBus {
    signals: Mutex<Option<mpsc::UnboundedSender<BusSignal>>>,
    endpoint: Mutex<Option<BusEndpoint>>,
    sent: Mutex<Vec<(String, String)>>,
    group_sent: Mutex<Vec<(Vec<u8>, String)>>,
    registration_fails: AtomicBool,
    send_fails: AtomicBool,
    disconnects: AtomicUsize,
}

impl MockBus {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Deliver a signal to the connected client
    pub fn emit(&self, signal: BusSignal) {
        let signals = self.signals.lock().unwrap();
        signals
            .as_ref()
            .expect("bus is not connected")
            .send(signal)
            .expect("client stopped listening");
    }

    pub fn emit_direct(&self, author: &str, content: &str) {
        self.emit(BusSignal::MessageReceived {
            timestamp: 1_640_995_200_000,
            author: author.to_string(),
            group_id: Vec::new(),
            content: content.to_string(),
            attachments: Vec::new(),
        });
    }

    pub fn emit_group(&self, author: &str, group_id: &[u8], content: &str) {
        self.emit(BusSignal::MessageReceived {
            timestamp: 1_640_995_200_000,
            author: author.to_string(),
            group_id: group_id.to_vec(),
            content: content.to_string(),
            attachments: vec!["/tmp/attachment.jpg".to_string()],
        });
    }

    pub fn fail_registration_check(&self) {
        self.registration_fails.store(true, Ordering::SeqCst);
    }

    pub fn restore_registration_check(&self) {
        self.registration_fails.store(false, Ordering::SeqCst);
    }

    pub fn fail_sends(&self) {
        self.send_fails.store(true, Ordering::SeqCst);
    }

    pub fn endpoint(&self) -> Option<BusEndpoint> {
        self.endpoint.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|(_, text)| text).collect()
    }

    pub fn group_sent(&self) -> Vec<(Vec<u8>, String)> {
        self.group_sent.lock().unwrap().clone()
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SignalBus for MockBus {
    async fn connect(&self, endpoint: &BusEndpoint) -> Result<mpsc::UnboundedReceiver<BusSignal>> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.signals.lock().unwrap() = Some(tx);
        *self.endpoint.lock().unwrap() = Some(endpoint.clone());
        Ok(rx)
    }

    async fn is_registered(&self) -> Result<bool> {
        if self.registration_fails.load(Ordering::SeqCst) {
            return Err(SignalBotError::Bus("org.freedesktop.DBus.Error.ServiceUnknown".to_string()));
        }
        Ok(true)
    }

    async fn send_message(&self, recipient: &str, text: &str) -> Result<()> {
        if self.send_fails.load(Ordering::SeqCst) {
            return Err(SignalBotError::Bus("Failed to send message".to_string()));
        }
        self.sent.lock().unwrap().push((recipient.to_string(), text.to_string()));
        Ok(())
    }

    async fn send_group_message(&self, group_id: &[u8], text: &str) -> Result<()> {
        self.group_sent.lock().unwrap().push((group_id.to_vec(), text.to_string()));
        Ok(())
    }

    async fn disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        self.signals.lock().unwrap().take();
    }
}

/// Poll `condition` until it holds, panicking after one second
pub async fn wait_until<F: Fn() -> bool>(condition: F) {
    for _ in 0..100 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not met within timeout");
}
