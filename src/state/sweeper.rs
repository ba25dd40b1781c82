//! Periodic eviction of abandoned flows

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, warn};

use super::manager::SceneManager;

/// Runs [`SceneManager::sweep_expired`] on an interval
#[derive(Debug)]
pub struct PerformanceSweeper {
    manager: Arc<SceneManager>,
    interval: Duration,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl PerformanceSweeper {
    pub fn new(manager: Arc<SceneManager>, interval: Duration) -> Self {
        Self {
            manager,
            interval,
            handle: None,
        }
    }

    /// Start the sweep task. Must be called from within a tokio runtime.
    pub fn start(&mut self) {
        if self.handle.is_some() {
            warn!("Sweep task is already running");
            return;
        }

        if self.manager.performance_ttl().is_none() {
            warn!("No performance TTL configured, sweeps will not evict anything");
        }

        let manager = self.manager.clone();
        let interval = self.interval;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);

            loop {
                ticker.tick().await;

                match manager.sweep_expired(Utc::now()) {
                    Ok(count) => {
                        if count > 0 {
                            info!("Sweep task removed {} expired performances", count);
                        }
                    }
                    Err(e) => {
                        error!("Sweep task failed: {}", e);
                    }
                }
            }
        });

        self.handle = Some(handle);
        info!("Started performance sweep task with interval {:?}", self.interval);
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            info!("Stopped performance sweep task");
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }
}

impl Drop for PerformanceSweeper {
    fn drop(&mut self) {
        self.stop();
    }
}
