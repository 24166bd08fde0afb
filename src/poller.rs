use chrono::Local;
use ratatui::backend::Backend;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::lxc::ContainerRuntime;
use crate::screen::ScreenGuard;
use crate::signals::{PauseGate, StopSignal};
use crate::store::ContainerStore;

/// Background refresh of the container store.
///
/// Skips the cycle while the pause gate is raised. Fetch failures are logged and
/// count as "no change"; only the stop signal ends the loop.
pub struct Poller<B: Backend> {
    pub runtime: Arc<dyn ContainerRuntime>,
    pub store: Arc<ContainerStore>,
    pub screen: ScreenGuard<B>,
    pub pause: Arc<PauseGate>,
    pub stop: StopSignal,
    pub interval: Duration,
}

impl<B: Backend + Send + 'static> Poller<B> {
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(self) {
        tracing::debug!("Poller started, interval {:?}", self.interval);
        while !self.stop.is_triggered() {
            self.poll_once().await;

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = self.stop.triggered() => break,
            }
        }
        tracing::debug!("Poller stopped");
    }

    /// One refresh cycle. Returns whether the store was replaced.
    pub async fn poll_once(&self) -> bool {
        if self.pause.is_raised() {
            tracing::trace!("Poll skipped, gate raised");
            return false;
        }

        let seen = self.store.generation();
        let include_stopped = self.store.include_stopped();
        let records = match self.runtime.list_containers(include_stopped).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!("Failed to refresh containers: {}", e);
                return false;
            }
        };

        // The gate may have gone up while the fetch was running.
        if self.pause.is_raised() {
            tracing::debug!("Discarding fetch result, gate raised during fetch");
            return false;
        }

        // Someone else wrote while we fetched; their list is newer.
        let changed = self.store.replace_if_current(seen, records);
        if changed {
            tracing::debug!("Container list refreshed");
        }
        self.screen.paint(|s| s.render_refresh_stamp(Local::now()));
        changed
    }
}
