//! Background sweep loop
//!
//! Runs [`RaidEngine::sweep`] on a fixed interval whose first tick lands on a
//! wall-clock minute boundary. While the transport is disconnected the loop is
//! parked; on reconnect it re-aligns to the next boundary.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::engine::RaidEngine;

/// Run the sweep loop until `cancel` is triggered
///
/// `connected` carries the transport connection state.
pub async fn run(
    engine: Arc<RaidEngine>,
    interval: Duration,
    mut connected: watch::Receiver<bool>,
    cancel: CancellationToken,
) {
    tracing::info!(interval_secs = interval.as_secs(), "Raid sweeper started");

    'outer: loop {
        // Park until the transport is up
        while !*connected.borrow_and_update() {
            tracing::debug!("Sweeper waiting for connection");
            tokio::select! {
                _ = cancel.cancelled() => break 'outer,
                changed = connected.changed() => {
                    if changed.is_err() {
                        break 'outer;
                    }
                }
            }
        }

        let now = engine.time().now();
        let delay = (engine.time().next_minute_boundary(now) - now)
            .to_std()
            .unwrap_or_default();

        tokio::select! {
            _ = cancel.cancelled() => break 'outer,
            () = tokio::time::sleep(delay) => {}
            changed = connected.changed() => {
                if changed.is_err() {
                    break 'outer;
                }
                // State flipped before the first tick; re-check from the top
                continue 'outer;
            }
        }

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break 'outer,
                changed = connected.changed() => {
                    if changed.is_err() {
                        break 'outer;
                    }
                    if !*connected.borrow_and_update() {
                        tracing::info!("Transport disconnected, sweeper paused");
                        continue 'outer;
                    }
                }
                _ = ticker.tick() => {
                    engine.sweep().await;
                }
            }
        }
    }

    tracing::info!("Raid sweeper stopped");
}
