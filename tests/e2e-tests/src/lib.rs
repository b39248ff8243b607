//! E2E test helpers for appherd.
//!
//! Fixtures are small `/bin/sh` scripts written into a per-test temp
//! directory. Scripts that spawn descendants record their PIDs in pid files
//! so tests can check every member of a tree independently.

#![cfg(unix)]

pub mod assertions;

use appherd_common::ManagedPath;
use appherd_managed_process::{Launcher, NoopResolver, ReleasePolicy};
use appherd_process_management::{MemoryPathStore, SupervisionRegistry};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Per-test scratch directory, removed on drop.
pub struct TestWorkspace {
    dir: TempDir,
}

impl TestWorkspace {
    pub fn new(test_name: &str) -> Self {
        let dir = tempfile::Builder::new()
            .prefix(&format!("appherd-e2e-{}-", test_name))
            .tempdir()
            .expect("Failed to create test directory");
        Self { dir }
    }

    /// Scratch directory under the current directory, so paths inside it
    /// can be named relatively (see [`TestWorkspace::relative`]).
    pub fn new_in_current_dir(test_name: &str) -> Self {
        let cwd = std::env::current_dir().expect("Failed to read current directory");
        let dir = tempfile::Builder::new()
            .prefix(&format!(".appherd-e2e-{}-", test_name))
            .tempdir_in(cwd)
            .expect("Failed to create test directory");
        Self { dir }
    }

    /// `name` inside this workspace, relative to the current directory.
    pub fn relative(&self, name: &str) -> ManagedPath {
        let dir = self.dir.path().file_name().expect("temp dir has a name");
        ManagedPath::from(Path::new(dir).join(name).to_string_lossy().into_owned())
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Write an executable `/bin/sh` script.
    pub fn script(&self, name: &str, body: &str) -> ManagedPath {
        self.write(name, body, 0o755)
    }

    /// Write a `/bin/sh` script without execute permission.
    pub fn plain_script(&self, name: &str, body: &str) -> ManagedPath {
        self.write(name, body, 0o644)
    }

    fn write(&self, name: &str, body: &str, mode: u32) -> ManagedPath {
        let path = self.file(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("Failed to write script");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(mode))
            .expect("Failed to set script permissions");
        ManagedPath::from(path.to_string_lossy().into_owned())
    }

    /// Script that backgrounds a long sleep, records both PIDs and waits.
    pub fn tree_script(&self, name: &str) -> ManagedPath {
        let body = format!(
            "sleep 300 &\necho $! > '{child}'\necho $$ > '{parent}'\nwait",
            child = self.child_pid_file(name).display(),
            parent = self.parent_pid_file(name).display(),
        );
        self.script(name, &body)
    }

    /// Script that exits right after starting a long-lived child.
    pub fn launcher_script(&self, name: &str) -> ManagedPath {
        let body = format!(
            "sleep 300 &\necho $! > '{child}'\nexit 0",
            child = self.child_pid_file(name).display(),
        );
        self.script(name, &body)
    }

    pub fn child_pid_file(&self, name: &str) -> PathBuf {
        self.file(&format!("{}.child.pid", name))
    }

    pub fn parent_pid_file(&self, name: &str) -> PathBuf {
        self.file(&format!("{}.parent.pid", name))
    }
}

/// Launcher that kills trees when their handles are released.
pub fn test_launcher() -> Launcher {
    Launcher::new(Arc::new(NoopResolver)).with_release_policy(ReleasePolicy::KillOnRelease)
}

/// Registry over an in-memory store preloaded with `paths`.
pub fn test_registry(paths: &[&ManagedPath]) -> SupervisionRegistry {
    let store = MemoryPathStore::with_lines(paths.iter().map(|p| p.as_str().to_string()));
    SupervisionRegistry::open(store, test_launcher()).expect("Failed to open registry")
}

/// Poll `condition` until it holds or `timeout` elapses.
pub fn wait_until<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
}

/// Wait for a pid file to appear and parse it.
pub fn read_pid_file(path: &Path, timeout: Duration) -> Result<u32, String> {
    let mut pid = None;
    wait_until(timeout, || {
        pid = std::fs::read_to_string(path)
            .ok()
            .and_then(|s| s.trim().parse::<u32>().ok());
        pid.is_some()
    });

    pid.ok_or_else(|| format!("PID file {} not written within {:?}", path.display(), timeout))
}

/// Whether `pid` is a running (non-zombie) process.
pub fn pid_running(pid: u32) -> bool {
    appherd_process::process_is_running(pid).unwrap_or(false)
}
