//! Signal daemon bus interface
//!
//! signal-cli exposes its account as the `org.asamk.Signal` D-Bus interface.
//! [`SignalBus`] is the seam the client talks through: an implementation
//! proxies the daemon's methods and forwards its signals. [`DbusBus`] is the
//! daemon implementation, [`ConsoleBus`] runs flows locally.
//!
//! [`DbusBus`]: super::DbusBus
//! [`ConsoleBus`]: super::ConsoleBus

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::config::{AccountMode, BusType, SignalConfig};
use crate::utils::errors::Result;

/// D-Bus interface name of the daemon
pub const SIGNAL_INTERFACE: &str = "org.asamk.Signal";

const OBJECT_PATH_PREFIX: &str = "/org/asamk/Signal/";

/// A signal emitted by the daemon
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusSignal {
    MessageReceived {
        /// Milliseconds since the Unix epoch
        timestamp: i64,
        author: String,
        /// Raw group ID, empty for direct messages
        group_id: Vec<u8>,
        content: String,
        attachments: Vec<String>,
    },
    Error(String),
}

/// Where the daemon's account object lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusEndpoint {
    pub bus_type: BusType,
    pub destination: String,
    pub object_path: String,
}

impl BusEndpoint {
    /// Resolve the endpoint for the configured account.
    ///
    /// In `multiple` mode the account number is appended to the object path
    /// with `+` replaced by `_`, as object paths cannot contain `+`.
    pub fn from_config(config: &SignalConfig) -> Self {
        let account = match config.account_mode {
            AccountMode::Single => String::new(),
            AccountMode::Multiple => config
                .account
                .as_deref()
                .unwrap_or_default()
                .replace('+', "_"),
        };

        Self {
            bus_type: config.bus_type,
            destination: config.destination.clone(),
            object_path: format!("{}{}", OBJECT_PATH_PREFIX, account),
        }
    }
}

/// Connection to the signal daemon
#[async_trait]
pub trait SignalBus: Send + Sync {
    /// Open the connection and subscribe to the daemon's signals
    async fn connect(&self, endpoint: &BusEndpoint) -> Result<mpsc::UnboundedReceiver<BusSignal>>;

    /// `isRegistered` on the daemon; used as the connection check
    async fn is_registered(&self) -> Result<bool>;

    async fn send_message(&self, recipient: &str, text: &str) -> Result<()>;

    async fn send_group_message(&self, group_id: &[u8], text: &str) -> Result<()>;

    /// Close the connection and stop forwarding signals
    async fn disconnect(&self);
}
