//! Cached "not running" observations.
//!
//! Only negative observations are cached: a process observed dead is
//! reported dead without another OS call until `requery_interval` has
//! elapsed. Positive observations are never cached. The cached value is
//! replaced as a whole under a lock, so concurrent readers never see a
//! partially updated observation.

use parking_lot::RwLock;
use std::time::{Duration, Instant};

/// Default staleness bound for a cached "not running" observation.
pub const DEFAULT_REQUERY_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug)]
pub struct LivenessCache {
    requery_interval: Duration,
    observed_dead_at: RwLock<Option<Instant>>,
}

impl LivenessCache {
    pub fn new(requery_interval: Duration) -> Self {
        Self {
            requery_interval,
            observed_dead_at: RwLock::new(None),
        }
    }

    /// True while a "not running" observation is still fresh.
    pub fn is_known_dead(&self) -> bool {
        match *self.observed_dead_at.read() {
            Some(at) => at.elapsed() < self.requery_interval,
            None => false,
        }
    }

    pub fn record_dead(&self) {
        *self.observed_dead_at.write() = Some(Instant::now());
    }

    pub fn invalidate(&self) {
        *self.observed_dead_at.write() = None;
    }
}

impl Default for LivenessCache {
    fn default() -> Self {
        Self::new(DEFAULT_REQUERY_INTERVAL)
    }
}
