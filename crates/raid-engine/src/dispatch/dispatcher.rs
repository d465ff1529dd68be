//! Event dispatcher
//!
//! Pumps inbound [`RaidEvent`]s into the engine without ever blocking the source.
//! Events addressing a message go to one of a fixed set of lanes chosen by
//! message id; each lane handles its events one after another, so notifications
//! for one raid are applied in the order they arrived while different raids
//! proceed in parallel. Recovery runs in its own task.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use raid_core::{RaidEvent, Snowflake};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::engine::RaidEngine;

/// Configuration for the event dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Number of sequential lanes
    pub lanes: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self { lanes: 16 }
    }
}

/// Event dispatcher that routes inbound notifications to the engine
pub struct EventDispatcher {
    engine: Arc<RaidEngine>,
    config: DispatcherConfig,
    /// Transport connection state, observed by the sweeper
    connected: watch::Sender<bool>,
    /// Lane workers and recovery passes
    tasks: TaskTracker,
    running: AtomicBool,
}

impl EventDispatcher {
    pub fn new(engine: Arc<RaidEngine>, config: DispatcherConfig) -> Self {
        let (connected, _) = watch::channel(false);
        Self {
            engine,
            config: DispatcherConfig {
                lanes: config.lanes.max(1),
            },
            connected,
            tasks: TaskTracker::new(),
            running: AtomicBool::new(false),
        }
    }

    /// Watch the transport connection state
    pub fn connection(&self) -> watch::Receiver<bool> {
        self.connected.subscribe()
    }

    /// Check if the dispatcher is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Start pumping events
    ///
    /// The returned task ends once `events` closes or `cancel` fires, after every
    /// queued event and in-flight recovery has finished. Returns `None` if the
    /// dispatcher is already running.
    pub fn start(
        self: Arc<Self>,
        events: mpsc::Receiver<RaidEvent>,
        cancel: CancellationToken,
    ) -> Option<JoinHandle<()>> {
        if self.running.swap(true, Ordering::SeqCst) {
            tracing::warn!("Event dispatcher is already running");
            return None;
        }

        let handle = tokio::spawn(async move {
            self.run(events, cancel).await;
        });

        tracing::info!("Event dispatcher started");
        Some(handle)
    }

    async fn run(&self, mut events: mpsc::Receiver<RaidEvent>, cancel: CancellationToken) {
        let lanes: Vec<mpsc::UnboundedSender<RaidEvent>> = (0..self.config.lanes)
            .map(|lane| {
                let (tx, rx) = mpsc::unbounded_channel();
                self.tasks
                    .spawn(drive_lane(Arc::clone(&self.engine), lane, rx));
                tx
            })
            .collect();

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    // Hand over whatever the source already queued
                    events.close();
                    while let Ok(event) = events.try_recv() {
                        self.dispatch(&lanes, event);
                    }
                    break;
                }
                event = events.recv() => match event {
                    Some(event) => self.dispatch(&lanes, event),
                    None => break,
                },
            }
        }

        // Closing the lanes lets each worker drain what it already holds
        drop(lanes);
        self.tasks.close();
        self.tasks.wait().await;

        self.running.store(false, Ordering::SeqCst);
        tracing::info!("Event dispatcher loop ended");
    }

    fn dispatch(&self, lanes: &[mpsc::UnboundedSender<RaidEvent>], event: RaidEvent) {
        tracing::trace!(event_type = event.event_type(), "Dispatching event");

        let message_id = match &event {
            RaidEvent::Connected => {
                self.connected.send_replace(true);
                tracing::info!("Transport connected");
                return;
            }
            RaidEvent::Disconnected => {
                self.connected.send_replace(false);
                tracing::warn!("Transport disconnected");
                return;
            }
            RaidEvent::SpaceAvailable(e) => {
                let engine = Arc::clone(&self.engine);
                let space_id = e.space_id;
                self.tasks.spawn(async move {
                    engine.on_available(space_id).await;
                });
                return;
            }
            RaidEvent::ReactionAdded(e) | RaidEvent::ReactionRemoved(e) => e.message_id,
            RaidEvent::MessageDeleted(e) => e.message_id,
        };

        let lane = lane_for(message_id, lanes.len());
        if lanes[lane].send(event).is_err() {
            tracing::warn!(lane, "Dispatch lane closed, event dropped");
        }
    }
}

impl Drop for EventDispatcher {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Lane index for a message
fn lane_for(message_id: Snowflake, lanes: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    message_id.hash(&mut hasher);
    (hasher.finish() % lanes as u64) as usize
}

async fn drive_lane(
    engine: Arc<RaidEngine>,
    lane: usize,
    mut events: mpsc::UnboundedReceiver<RaidEvent>,
) {
    while let Some(event) = events.recv().await {
        engine.handle(event).await;
    }
    tracing::debug!(lane, "Dispatch lane closed");
}
