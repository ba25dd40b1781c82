//! Signal client module
//!
//! This module connects to the signal-cli daemon, turns its signals into
//! client events and delivers outgoing messages.

pub mod bus;
pub mod connection;
pub mod console;
pub mod conversations;
pub mod dbus;

pub use bus::{BusEndpoint, BusSignal, SignalBus, SIGNAL_INTERFACE};
pub use connection::{Client, ClientEvent, ClientUser};
pub use console::ConsoleBus;
pub use conversations::ConversationManager;
pub use dbus::DbusBus;
