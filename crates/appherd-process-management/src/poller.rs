//! Periodic status polling.
//!
//! Each tick performs only the per-entry liveness queries of
//! [`SupervisionRegistry::list_entries`]; missed ticks are skipped rather
//! than bursted.

use crate::registry::SupervisionRegistry;
use crate::status::{CommonStatus, EntryStatus};
use std::ops::ControlFlow;
use std::time::Duration;
use tokio::time::{interval, Instant, Interval, MissedTickBehavior};
use tracing::debug;

pub struct StatusPoller {
    interval: Interval,
    last_common: Option<CommonStatus>,
}

impl StatusPoller {
    /// The first tick completes immediately.
    pub fn new(period: Duration) -> Self {
        let mut interval = interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self {
            interval,
            last_common: None,
        }
    }

    pub fn period(&self) -> Duration {
        self.interval.period()
    }

    /// Wait for the next tick.
    pub async fn tick(&mut self) -> Instant {
        self.interval.tick().await
    }

    /// Record a snapshot. Returns the common status when it differs from the
    /// previously observed one.
    pub fn observe(&mut self, snapshot: &[EntryStatus]) -> Option<CommonStatus> {
        let common = CommonStatus::from_snapshot(snapshot);
        if self.last_common == Some(common) {
            return None;
        }
        debug!("Common status changed to {}", common);
        self.last_common = Some(common);
        Some(common)
    }

    /// Poll `registry` on every tick and hand each snapshot to `on_snapshot`
    /// until it breaks.
    pub async fn run<F>(&mut self, registry: &mut SupervisionRegistry, mut on_snapshot: F)
    where
        F: FnMut(&[EntryStatus]) -> ControlFlow<()>,
    {
        loop {
            self.tick().await;
            let snapshot = registry.list_entries();
            self.observe(&snapshot);
            if on_snapshot(&snapshot).is_break() {
                return;
            }
        }
    }
}
