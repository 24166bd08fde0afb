use ratatui::backend::Backend;
use std::sync::Arc;
use std::time::Duration;

use crate::events::handler::{DispatchSettings, Dispatcher};
use crate::events::input::InputSource;
use crate::events::key_bindings::Keymap;
use crate::lxc::ContainerRuntime;
use crate::poller::Poller;
use crate::screen::ScreenGuard;
use crate::signals::{PauseGate, StopSignal};
use crate::store::ContainerStore;
use crate::types::{AppConfig, Result};

/// Handles shared by the dispatcher, the poller and the executor.
pub struct Shared<B: Backend> {
    pub runtime: Arc<dyn ContainerRuntime>,
    pub store: Arc<ContainerStore>,
    pub screen: ScreenGuard<B>,
    pub pause: Arc<PauseGate>,
    pub stop: StopSignal,
}

impl<B: Backend> Clone for Shared<B> {
    fn clone(&self) -> Self {
        Self {
            runtime: Arc::clone(&self.runtime),
            store: Arc::clone(&self.store),
            screen: self.screen.clone(),
            pause: Arc::clone(&self.pause),
            stop: self.stop.clone(),
        }
    }
}

pub struct App<B: Backend, I: InputSource> {
    pub shared: Shared<B>,
    pub dispatcher: Dispatcher<B, I>,
}

impl<B, I> App<B, I>
where
    B: Backend + Send + 'static,
    I: InputSource,
{
    /// Fetches the initial list, then starts the poller in the background.
    /// A failing first fetch is fatal.
    pub async fn new(
        config: &AppConfig,
        runtime: Arc<dyn ContainerRuntime>,
        screen: ScreenGuard<B>,
        input: I,
    ) -> Result<Self> {
        let records = runtime.list_containers(config.show_stopped).await?;
        tracing::info!("Loaded {} containers", records.len());

        let shared = Shared {
            runtime,
            store: ContainerStore::new(records, config.show_stopped),
            screen,
            pause: PauseGate::new(),
            stop: StopSignal::new(),
        };

        let mut dispatcher = Dispatcher::new(
            shared.clone(),
            input,
            Keymap::with_extra(&config.bindings),
            DispatchSettings::from(config),
        );

        let poller = Poller {
            runtime: Arc::clone(&shared.runtime),
            store: Arc::clone(&shared.store),
            screen: shared.screen.clone(),
            pause: Arc::clone(&shared.pause),
            stop: shared.stop.clone(),
            interval: Duration::from_secs(config.poll_interval_secs),
        };
        dispatcher.attach_poller(poller.spawn());

        Ok(Self { shared, dispatcher })
    }

    pub async fn run(&mut self) -> Result<()> {
        self.dispatcher.run().await
    }
}
