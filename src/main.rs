//! signal-bot
//!
//! Main application entry point. Runs the registration flow against the
//! signal-cli daemon, or over stdin/stdout with `signal.transport = "console"`.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use signal_bot::{
    client::{Client, ConsoleBus, DbusBus, SignalBus},
    config::{Settings, Transport},
    handlers::{registration_flow, run_event_loop},
    state::PerformanceSweeper,
    utils::logging,
};

const CONSOLE_AUTHOR: &str = "+10000000000";
const DEFAULT_START_TRIGGER: &str = "/register";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let settings = Settings::new().context("failed to load settings")?;
    settings.validate()?;

    // Initialize logging
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", signal_bot::info());

    // Build and verify the flows
    let mut scenes = registration_flow();
    if let Some(ttl) = settings.scenes.performance_ttl() {
        scenes = scenes.with_performance_ttl(ttl);
    }
    scenes.verify()?;
    let scenes = Arc::new(scenes);

    let mut sweeper = PerformanceSweeper::new(scenes.clone(), settings.scenes.sweep_interval());
    if scenes.performance_ttl().is_some() {
        sweeper.start();
    }

    let start_trigger = settings
        .scenes
        .start_trigger
        .clone()
        .unwrap_or_else(|| DEFAULT_START_TRIGGER.to_string());
    info!(start_trigger = %start_trigger, "Send the start trigger to begin registration");

    // Connect the client
    let bus: Arc<dyn SignalBus> = match settings.signal.transport {
        Transport::Dbus => Arc::new(DbusBus::new()),
        Transport::Console => Arc::new(ConsoleBus::new(CONSOLE_AUTHOR)),
    };
    let mut client = Client::new(&settings, bus)?;
    let events = client.connect().await?;

    run_event_loop(events, scenes, Some(start_trigger)).await?;

    sweeper.stop();
    client.shutdown().await;

    info!("signal-bot has been shut down.");
    Ok(())
}
