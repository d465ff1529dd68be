//! Runtime wiring
//!
//! Builds the engine from configuration and runs the event dispatcher and the
//! sweeper until shut down.

use std::sync::Arc;
use std::time::Duration;

use raid_common::{AppConfig, AppError, AppResult, RaidSettings};
use raid_core::{ChannelRegistry, ChatTransport, PlayerDirectory, RaidEvent, TimeService};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::dispatch::{DispatcherConfig, EventDispatcher};
use crate::engine::{EngineSettings, RaidEngine};
use crate::sweeper;

/// Handle to a running raid engine
pub struct RaidRuntime {
    engine: Arc<RaidEngine>,
    events: mpsc::Sender<RaidEvent>,
    cancel: CancellationToken,
    dispatcher: JoinHandle<()>,
    sweeper: JoinHandle<()>,
}

impl RaidRuntime {
    /// Build an engine from configuration and start it on the system clock
    ///
    /// # Errors
    /// Returns an error if the engine cannot be assembled
    pub fn start(
        config: &AppConfig,
        transport: Arc<dyn ChatTransport>,
        directory: Arc<dyn PlayerDirectory>,
    ) -> AppResult<Self> {
        let engine = RaidEngine::builder()
            .transport(transport)
            .directory(directory)
            .time(TimeService::system(config.raid.timezone))
            .channels(ChannelRegistry::new(config.channels.iter().copied()))
            .settings(EngineSettings::from(&config.raid))
            .build()?;

        tracing::info!(
            app = %config.app.name,
            channels = config.channels.len(),
            timezone = %config.raid.timezone,
            "Starting raid runtime"
        );

        Self::start_engine(Arc::new(engine), &config.raid)
    }

    /// Start the background tasks around an already built engine
    ///
    /// # Errors
    /// Returns an error if the dispatcher was already started
    pub fn start_engine(engine: Arc<RaidEngine>, settings: &RaidSettings) -> AppResult<Self> {
        let cancel = CancellationToken::new();
        let (events, receiver) = mpsc::channel(settings.event_buffer);

        let dispatcher = Arc::new(EventDispatcher::new(
            Arc::clone(&engine),
            DispatcherConfig {
                lanes: settings.dispatch_lanes,
            },
        ));
        let connection = dispatcher.connection();
        let dispatcher = dispatcher
            .start(receiver, cancel.clone())
            .ok_or_else(|| AppError::validation("dispatcher already running"))?;

        let sweeper = tokio::spawn(sweeper::run(
            Arc::clone(&engine),
            settings.sweep_interval,
            connection,
            cancel.clone(),
        ));

        Ok(Self {
            engine,
            events,
            cancel,
            dispatcher,
            sweeper,
        })
    }

    /// Sender the transport delivers notifications into
    pub fn events(&self) -> mpsc::Sender<RaidEvent> {
        self.events.clone()
    }

    pub fn engine(&self) -> &Arc<RaidEngine> {
        &self.engine
    }

    /// Stop both background tasks and wait for them
    ///
    /// Events already queued are still handled before the dispatcher exits.
    ///
    /// # Errors
    /// Returns `AppError::TaskFailed` if a task panicked
    pub async fn shutdown(self) -> AppResult<()> {
        tracing::info!("Shutting down raid runtime");
        self.cancel.cancel();
        drop(self.events);

        self.dispatcher
            .await
            .map_err(|e| AppError::TaskFailed(format!("dispatcher: {e}")))?;
        self.sweeper
            .await
            .map_err(|e| AppError::TaskFailed(format!("sweeper: {e}")))?;
        Ok(())
    }

    /// Like [`shutdown`](Self::shutdown), giving up after `timeout`
    ///
    /// # Errors
    /// Returns `AppError::TaskFailed` if the tasks do not finish in time
    pub async fn shutdown_timeout(self, timeout: Duration) -> AppResult<()> {
        tokio::time::timeout(timeout, self.shutdown())
            .await
            .map_err(|_| AppError::TaskFailed("shutdown timed out".to_string()))?
    }
}
