//! ManagedProcess - one supervised process instance.
//!
//! Owns the OS child handle and the grouping construct the child was
//! assigned to. Nothing else holds either of them.
//!
//! Liveness is the liveness of the whole group: a launcher process that
//! exits after starting the real application still leaves the entry
//! alive, as long as anything it spawned is running.
//!
//! ## Query failures
//!
//! If the OS refuses to report liveness the process is reported as **not
//! running**. A process whose state cannot be determined is treated
//! conservatively so callers never show a permanently ambiguous state.

use crate::liveness::LivenessCache;
use appherd_common::{ManagedPath, ProcessResult};
use appherd_process::{GroupingHandle, ReleasePolicy};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::process::Child;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const REAP_TIMEOUT: Duration = Duration::from_millis(250);
const REAP_POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug)]
pub struct ManagedProcess {
    path: ManagedPath,
    pid: u32,
    argv: Vec<String>,
    started_at: DateTime<Utc>,
    child: Mutex<Child>,
    group: GroupingHandle,
    liveness: LivenessCache,
}

impl ManagedProcess {
    /// Bundle a freshly spawned child with the grouping it was assigned to.
    ///
    /// Only the launcher creates instances.
    pub(crate) fn new(
        path: ManagedPath,
        argv: Vec<String>,
        child: Child,
        group: GroupingHandle,
        liveness: LivenessCache,
    ) -> Self {
        Self {
            path,
            pid: child.id(),
            argv,
            started_at: Utc::now(),
            child: Mutex::new(child),
            group,
            liveness,
        }
    }

    pub fn path(&self) -> &ManagedPath {
        &self.path
    }

    /// PID of the directly launched process.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Command line the process was started with.
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn release_policy(&self) -> ReleasePolicy {
        self.group.policy()
    }

    pub fn exists_on_disk(&self) -> bool {
        self.path.exists_on_disk()
    }

    /// Whether any process of this instance's tree is still running.
    pub fn is_alive(&self) -> bool {
        if self.liveness.is_known_dead() {
            return false;
        }

        let alive = self.query_alive();
        if !alive {
            self.liveness.record_dead();
        }
        alive
    }

    fn query_alive(&self) -> bool {
        // Reap the direct child first; an unreaped zombie would keep the
        // group looking alive.
        self.reap_if_exited();

        match self.group.has_live_members() {
            Ok(alive) => alive,
            Err(e) => {
                warn!(
                    "Liveness of {} (PID {}) could not be determined, reporting not running: {}",
                    self.path, self.pid, e
                );
                false
            }
        }
    }

    fn reap_if_exited(&self) -> bool {
        let mut child = self.child.lock();
        match child.try_wait() {
            Ok(Some(status)) => {
                debug!("{} (PID {}) exited: {}", self.path, self.pid, status);
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!("try_wait failed for {} (PID {}): {}", self.path, self.pid, e);
                false
            }
        }
    }

    /// Forcefully terminate the whole process tree.
    ///
    /// A no-op on an already-dead tree. The liveness cache is cleared, so
    /// the next [`ManagedProcess::is_alive`] asks the OS again.
    pub fn kill(&self) -> ProcessResult<()> {
        self.liveness.invalidate();
        info!("Killing {} (PID {})", self.path, self.pid);

        let result = self.group.terminate_all();
        self.reap_with_timeout(REAP_TIMEOUT);
        self.liveness.invalidate();
        result
    }

    fn reap_with_timeout(&self, timeout: Duration) {
        let deadline = Instant::now() + timeout;
        while !self.reap_if_exited() {
            if Instant::now() >= deadline {
                debug!("{} (PID {}) not reaped within {:?}", self.path, self.pid, timeout);
                return;
            }
            std::thread::sleep(REAP_POLL_INTERVAL);
        }
    }
}

impl Drop for ManagedProcess {
    fn drop(&mut self) {
        if self.group.policy() == ReleasePolicy::KillOnRelease {
            if let Err(e) = self.group.terminate_all() {
                warn!("Failed to terminate {} on release: {}", self.path, e);
            }
            self.reap_with_timeout(REAP_TIMEOUT);
        }
        debug!("Released managed process {} (PID {})", self.path, self.pid);
    }
}
