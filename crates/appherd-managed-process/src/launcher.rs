//! Launcher - starts managed paths inside fresh grouping constructs.
//!
//! Each launch:
//! 1. resolves the invocation (direct, or through the [`CommandResolver`])
//! 2. creates a new [`GroupingHandle`]
//! 3. spawns the child detached from the supervisor's own process group
//! 4. assigns the child to the grouping and returns a [`ManagedProcess`]
//!
//! On any failure nothing is left behind: the grouping is released and a
//! child that was already spawned is killed and reaped.

use crate::liveness::{LivenessCache, DEFAULT_REQUERY_INTERVAL};
use crate::managed_process::ManagedProcess;
use crate::resolver::CommandResolver;
use appherd_common::{ManagedPath, ProcessError, ProcessResult};
use appherd_process::{detached_command, GroupingHandle, ReleasePolicy};
use std::path::{Path, PathBuf};
use std::process::Child;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Whether the host can execute `path` without a launcher command.
///
/// Unix: a regular file with any execute bit set. Windows: `.exe`/`.com`.
pub fn is_directly_executable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        std::fs::metadata(path)
            .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }

    #[cfg(windows)]
    {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("exe") || ext.eq_ignore_ascii_case("com"))
            .unwrap_or(false)
    }
}

#[derive(Clone)]
pub struct Launcher {
    resolver: Arc<dyn CommandResolver>,
    release_policy: ReleasePolicy,
    requery_interval: Duration,
}

impl Launcher {
    pub fn new(resolver: Arc<dyn CommandResolver>) -> Self {
        Self {
            resolver,
            release_policy: ReleasePolicy::default(),
            requery_interval: DEFAULT_REQUERY_INTERVAL,
        }
    }

    /// Release policy given to every grouping this launcher creates.
    pub fn with_release_policy(mut self, policy: ReleasePolicy) -> Self {
        self.release_policy = policy;
        self
    }

    /// Staleness bound of cached "not running" observations.
    pub fn with_requery_interval(mut self, interval: Duration) -> Self {
        self.requery_interval = interval;
        self
    }

    pub fn release_policy(&self) -> ReleasePolicy {
        self.release_policy
    }

    /// Command line that would be used to start `path`.
    ///
    /// A relative path is anchored at the supervisor's current directory,
    /// since the child runs in a different one.
    pub fn resolve(&self, path: &ManagedPath) -> ProcessResult<Vec<String>> {
        let invoked = invocation_path(path)?;
        let direct = || vec![invoked.to_string_lossy().into_owned()];

        if is_directly_executable(&invoked) {
            return Ok(direct());
        }

        match self.resolver.resolve(&invoked) {
            Some(argv) if argv.is_empty() => Err(ProcessError::launch_failed(
                path.as_str(),
                "resolved command line is empty",
            )),
            Some(argv) => Ok(argv),
            None => Ok(direct()),
        }
    }

    /// Start `path` with `working_directory` as its current directory.
    pub fn start(&self, path: &ManagedPath, working_directory: &Path) -> ProcessResult<ManagedProcess> {
        if !path.exists_on_disk() {
            return Err(ProcessError::launch_failed(path.as_str(), "file not found"));
        }

        let argv = self.resolve(path)?;
        debug!("Launching {} as {:?}", path, argv);

        let mut cmd = detached_command(&argv, working_directory).ok_or_else(|| {
            ProcessError::launch_failed(path.as_str(), "resolved command line is empty")
        })?;

        let mut group = GroupingHandle::with_policy(self.release_policy)?;
        group.prepare(&mut cmd);

        let child = cmd.spawn().map_err(|e| {
            error!("Failed to spawn {}: {}", path, e);
            match e.kind() {
                std::io::ErrorKind::OutOfMemory => ProcessError::resource_exhausted(format!(
                    "Failed to create process for {}: {}",
                    path, e
                )),
                _ => ProcessError::launch_failed(path.as_str(), e.to_string()),
            }
        })?;

        let child = assign_or_reap(path, child, &mut group)?;

        info!("Started {} (PID: {})", path, child.id());
        Ok(ManagedProcess::new(
            path.clone(),
            argv,
            child,
            group,
            LivenessCache::new(self.requery_interval),
        ))
    }
}

/// Absolute form of `path` used to invoke it. The registry key is untouched.
fn invocation_path(path: &ManagedPath) -> ProcessResult<PathBuf> {
    if path.as_path().is_absolute() {
        return Ok(path.as_path().to_path_buf());
    }

    let cwd = std::env::current_dir().map_err(|e| {
        ProcessError::launch_failed(path.as_str(), format!("cannot read current directory: {}", e))
    })?;
    Ok(cwd.join(path.as_path()))
}

/// Assign `child` to `group`. If that fails the child is killed and reaped
/// before the error is returned.
fn assign_or_reap(path: &ManagedPath, mut child: Child, group: &mut GroupingHandle) -> ProcessResult<Child> {
    match group.assign(&child) {
        Ok(()) => Ok(child),
        Err(e) => {
            warn!("Assignment of {} (PID {}) failed, killing it: {}", path, child.id(), e);
            let _ = child.kill();
            let _ = child.wait();
            Err(e)
        }
    }
}

impl std::fmt::Debug for Launcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Launcher")
            .field("release_policy", &self.release_policy)
            .field("requery_interval", &self.requery_interval)
            .finish_non_exhaustive()
    }
}
