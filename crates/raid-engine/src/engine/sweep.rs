//! Periodic refresh and expiry

use raid_core::TransportError;
use tracing::{info, instrument, warn};

use super::RaidEngine;
use crate::store::RaidKey;

/// Outcome of one sweep
#[derive(Debug, Default)]
pub struct SweepReport {
    /// Active raids re-rendered successfully
    pub refreshed: usize,
    /// Raids found expired and removed from the store
    pub expired: Vec<RaidKey>,
    /// Pushes that failed; those raids stay and are retried next sweep
    pub failures: Vec<(RaidKey, TransportError)>,
}

impl SweepReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl RaidEngine {
    /// Re-render every active raid and retire expired ones
    ///
    /// Raids are visited one at a time under their own lock. A failed push is
    /// recorded and the sweep moves on.
    #[instrument(skip(self))]
    pub async fn sweep(&self) -> SweepReport {
        let mut report = SweepReport::default();

        for slot in self.store.enumerate_all() {
            let key = slot.key();
            let record = slot.lock().await;
            let now = self.time.now();

            if record.is_expired(now, &self.settings.policy) {
                // Final render so the message shows the raid is over
                let _ = self.push(key, &record).await;
                drop(record);
                self.store.remove_slot(&slot);
                report.expired.push(key);
                continue;
            }

            match self.push(key, &record).await {
                Ok(()) => report.refreshed += 1,
                Err(e) => report.failures.push((key, e)),
            }
        }

        if report.is_clean() {
            info!(
                refreshed = report.refreshed,
                expired = report.expired.len(),
                "Sweep finished"
            );
        } else {
            warn!(
                refreshed = report.refreshed,
                expired = report.expired.len(),
                failed = report.failures.len(),
                "Sweep finished with failures"
            );
        }

        report
    }
}
