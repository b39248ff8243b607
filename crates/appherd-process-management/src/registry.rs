//! SupervisionRegistry - ordered set of managed paths and their live processes.
//!
//! The ordered path list is the display order and is persisted through a
//! [`PathStore`] after every mutation. After each save the list is read
//! back, so whatever normalisation the store applies is reflected here.
//!
//! A path maps to at most one live [`ManagedProcess`]. Instances are only
//! created by a launch; once observed dead they are dropped, and the next
//! start creates a fresh process with a fresh grouping.
//!
//! All mutation goes through `&mut self`, so operations on one path are
//! serialised by construction.

use crate::status::EntryStatus;
use crate::store::PathStore;
use appherd_common::{Error, ManagedPath, ProcessError, ProcessResult, Result};
use appherd_managed_process::{Launcher, ManagedProcess};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Lookup result of [`SupervisionRegistry::process_for`].
#[derive(Debug)]
pub enum ProcessSlot<'a> {
    Live(&'a ManagedProcess),
    Absent(ManagedPath),
}

impl ProcessSlot<'_> {
    pub fn is_alive(&self) -> bool {
        match self {
            ProcessSlot::Live(process) => process.is_alive(),
            ProcessSlot::Absent(_) => false,
        }
    }

    pub fn exists_on_disk(&self) -> bool {
        match self {
            ProcessSlot::Live(process) => process.exists_on_disk(),
            ProcessSlot::Absent(path) => path.exists_on_disk(),
        }
    }

    pub fn pid(&self) -> Option<u32> {
        match self {
            ProcessSlot::Live(process) => Some(process.pid()),
            ProcessSlot::Absent(_) => None,
        }
    }
}

/// Outcome of a bulk operation. Every entry is attempted.
#[derive(Debug, Default)]
pub struct BulkReport {
    pub succeeded: Vec<ManagedPath>,
    pub failed: Vec<(ManagedPath, ProcessError)>,
}

impl BulkReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct SupervisionRegistry {
    store: Box<dyn PathStore>,
    launcher: Launcher,
    order: Vec<ManagedPath>,
    live: HashMap<ManagedPath, ManagedProcess>,
}

impl SupervisionRegistry {
    /// Load the managed-path list and build an empty registry around it.
    pub fn open<S>(store: S, launcher: Launcher) -> Result<Self>
    where
        S: PathStore + 'static,
    {
        let order = store
            .load()
            .map_err(|e| e.context("Failed to load managed paths"))?;
        info!("Opened registry with {} managed paths", order.len());

        Ok(Self {
            store: Box::new(store),
            launcher,
            order,
            live: HashMap::new(),
        })
    }

    /// Managed paths in insertion order.
    pub fn entries(&self) -> &[ManagedPath] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, path: &ManagedPath) -> bool {
        self.order.contains(path)
    }

    pub fn launcher(&self) -> &Launcher {
        &self.launcher
    }

    /// Live instance for `path`, or an absent sentinel.
    ///
    /// A dead instance is dropped on the way and reported as absent.
    pub fn process_for(&mut self, path: &ManagedPath) -> ProcessSlot<'_> {
        self.prune(path);
        match self.live.get(path) {
            Some(process) => ProcessSlot::Live(process),
            None => ProcessSlot::Absent(path.clone()),
        }
    }

    pub fn is_alive(&mut self, path: &ManagedPath) -> bool {
        self.process_for(path).is_alive()
    }

    fn prune(&mut self, path: &ManagedPath) {
        let dead = self
            .live
            .get(path)
            .map(|process| !process.is_alive())
            .unwrap_or(false);

        if dead {
            if let Some(process) = self.live.remove(path) {
                debug!("Dropping dead instance of {} (PID {})", path, process.pid());
            }
        }
    }

    /// Add paths to the end of the list. Blank and already managed paths are skipped.
    ///
    /// Returns the paths that were actually added.
    pub fn add<I, P>(&mut self, paths: I) -> Result<Vec<ManagedPath>>
    where
        I: IntoIterator<Item = P>,
        P: Into<ManagedPath>,
    {
        let mut next = self.order.clone();
        let mut added = Vec::new();

        for path in paths {
            let path: ManagedPath = path.into();
            let path = ManagedPath::new(path.as_str().trim());
            if path.as_str().is_empty() || next.contains(&path) {
                continue;
            }
            next.push(path.clone());
            added.push(path);
        }

        if added.is_empty() {
            return Ok(added);
        }

        self.persist(&next)?;
        info!("Added {} managed paths", added.len());
        Ok(added)
    }

    /// Stop managing `path`. Its process is released under the launcher's policy.
    pub fn remove(&mut self, path: &ManagedPath) -> Result<()> {
        if !self.contains(path) {
            return Err(Error::from(ProcessError::not_managed(path.as_str())));
        }

        let next: Vec<ManagedPath> = self.order.iter().filter(|p| *p != path).cloned().collect();
        self.persist(&next)?;
        info!("Removed {}", path);
        Ok(())
    }

    /// Stop managing every path.
    pub fn remove_all(&mut self) -> Result<()> {
        self.persist(&[])?;
        info!("Removed all managed paths");
        Ok(())
    }

    fn persist(&mut self, next: &[ManagedPath]) -> Result<()> {
        self.store.save(next)?;
        self.order = self.store.load()?;

        // Release instances whose path is no longer managed
        let order = &self.order;
        let released: Vec<ManagedPath> = self
            .live
            .keys()
            .filter(|path| !order.contains(path))
            .cloned()
            .collect();
        for path in released {
            if let Some(process) = self.live.remove(&path) {
                debug!(
                    "Releasing {} (PID {}) with policy {:?}",
                    path,
                    process.pid(),
                    process.release_policy()
                );
            }
        }

        Ok(())
    }

    fn ensure_managed(&self, path: &ManagedPath) -> ProcessResult<()> {
        if self.contains(path) {
            Ok(())
        } else {
            Err(ProcessError::not_managed(path.as_str()))
        }
    }

    /// Launch `path` unless it is already running.
    pub fn start(&mut self, path: &ManagedPath) -> ProcessResult<()> {
        self.ensure_managed(path)?;
        if self.is_alive(path) {
            debug!("{} is already running", path);
            return Ok(());
        }

        let process = self.launcher.start(path, &path.working_directory())?;
        self.live.insert(path.clone(), process);
        Ok(())
    }

    /// Kill the whole tree of `path`. A not-running entry is left alone.
    pub fn kill(&mut self, path: &ManagedPath) -> ProcessResult<()> {
        self.ensure_managed(path)?;
        match self.process_for(path) {
            ProcessSlot::Live(process) => process.kill(),
            ProcessSlot::Absent(_) => {
                debug!("{} is not running", path);
                Ok(())
            }
        }
    }

    /// Bring `path` to the target state; no-op when it is already there.
    pub fn set_alive(&mut self, path: &ManagedPath, target: bool) -> ProcessResult<()> {
        if target {
            self.start(path)
        } else {
            self.kill(path)
        }
    }

    /// Flip the state of `path`. Returns the state that was requested.
    pub fn toggle(&mut self, path: &ManagedPath) -> ProcessResult<bool> {
        self.ensure_managed(path)?;
        let target = !self.is_alive(path);
        self.set_alive(path, target)?;
        Ok(target)
    }

    /// Apply [`SupervisionRegistry::set_alive`] to every entry independently.
    pub fn set_all_alive(&mut self, target: bool) -> BulkReport {
        let mut report = BulkReport::default();

        for path in self.order.clone() {
            match self.set_alive(&path, target) {
                Ok(()) => report.succeeded.push(path),
                Err(e) => {
                    warn!("Failed to set {} alive={}: {}", path, target, e);
                    report.failed.push((path, e));
                }
            }
        }

        info!(
            "set_all_alive({}): {} succeeded, {} failed",
            target,
            report.succeeded.len(),
            report.failed.len()
        );
        report
    }

    /// Status snapshot of every entry in display order.
    pub fn list_entries(&mut self) -> Vec<EntryStatus> {
        self.order
            .clone()
            .into_iter()
            .map(|path| {
                let slot = self.process_for(&path);
                let is_alive = slot.is_alive();
                let exists_on_disk = slot.exists_on_disk();
                let pid = slot.pid();
                EntryStatus {
                    path,
                    exists_on_disk,
                    is_alive,
                    pid,
                }
            })
            .collect()
    }
}

impl std::fmt::Debug for SupervisionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupervisionRegistry")
            .field("launcher", &self.launcher)
            .field("order", &self.order)
            .field("live", &self.live.len())
            .finish_non_exhaustive()
    }
}
