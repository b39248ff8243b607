//! Grouping handle - ownership wrapper around one OS process-grouping resource.
//!
//! A [`GroupingHandle`] owns exactly one native grouping construct:
//!
//! - **Unix**: a process group. The launched child calls `setsid()` before
//!   `exec` (see [`GroupingHandle::prepare`]), so it leads a fresh session and
//!   group and every descendant inherits that group. The handle adopts the
//!   group on [`GroupingHandle::assign`].
//! - **Windows**: a Job Object. The child starts suspended, is assigned to
//!   the job, and only then resumes, so no descendant can start outside it.
//!
//! ## Release
//!
//! The native resource is released exactly once, when the handle is dropped.
//! Under [`ReleasePolicy::KillOnRelease`] (the default) every process still
//! in the group is terminated at that point; [`ReleasePolicy::Detach`] leaves
//! them running. A handle that never had a process assigned is inert and
//! releasing it has no effect on any process.

use appherd_common::{ProcessError, ProcessResult};
use std::process::{Child, Command};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::{debug, warn};

static OUTSTANDING_GROUPINGS: AtomicUsize = AtomicUsize::new(0);

/// Number of grouping handles currently alive in this process.
pub fn outstanding_groupings() -> usize {
    OUTSTANDING_GROUPINGS.load(Ordering::SeqCst)
}

/// What happens to remaining group members when the handle is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReleasePolicy {
    /// Terminate every process still assigned (closing the supervisor kills the tree).
    #[default]
    KillOnRelease,
    /// Release the native resource and leave the processes running.
    Detach,
}

#[derive(Debug)]
pub struct GroupingHandle {
    policy: ReleasePolicy,
    #[cfg(unix)]
    pgid: Option<u32>,
    #[cfg(windows)]
    job: crate::grouping_windows::JobObject,
    /// Set once an assigned grouping was seen with no live member. A group
    /// id is never signalled after that, as the host may reuse it.
    observed_empty: AtomicBool,
}

impl GroupingHandle {
    /// Acquire a new grouping resource with the default release policy.
    pub fn create() -> ProcessResult<Self> {
        Self::with_policy(ReleasePolicy::default())
    }

    /// Acquire a new grouping resource.
    ///
    /// Fails with `ResourceExhausted` if the host denies creation.
    pub fn with_policy(policy: ReleasePolicy) -> ProcessResult<Self> {
        #[cfg(windows)]
        let job = crate::grouping_windows::JobObject::create(policy == ReleasePolicy::KillOnRelease)?;

        OUTSTANDING_GROUPINGS.fetch_add(1, Ordering::SeqCst);

        Ok(Self {
            policy,
            #[cfg(unix)]
            pgid: None,
            #[cfg(windows)]
            job,
            observed_empty: AtomicBool::new(false),
        })
    }

    pub fn policy(&self) -> ReleasePolicy {
        self.policy
    }

    /// Configure `cmd` so the spawned child can be assigned to this grouping.
    ///
    /// On Unix the child becomes a session and group leader, detached from
    /// the supervisor's own group so signals sent to the supervisor's group
    /// never reach it. On Windows it starts suspended in a new console
    /// process group.
    pub fn prepare(&self, cmd: &mut Command) {
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;

            // Safety: setsid() is async-signal-safe and touches no memory
            // shared with the parent.
            unsafe {
                cmd.pre_exec(|| {
                    nix::unistd::setsid()
                        .map(|_| ())
                        .map_err(std::io::Error::from)
                });
            }
        }

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;

            const CREATE_SUSPENDED: u32 = 0x00000004;
            const CREATE_NEW_PROCESS_GROUP: u32 = 0x00000200;
            cmd.creation_flags(CREATE_SUSPENDED | CREATE_NEW_PROCESS_GROUP);
        }
    }

    /// Place a live process under this grouping's control.
    ///
    /// Fails with `InvalidState` if the grouping already owns a process, if
    /// the process has exited, or if it belongs to another grouping.
    pub fn assign(&mut self, child: &Child) -> ProcessResult<()> {
        let pid = child.id();

        #[cfg(unix)]
        {
            if let Some(pgid) = self.pgid {
                return Err(ProcessError::invalid_state(
                    pid.to_string(),
                    "unassigned grouping",
                    format!("grouping already owns process group {}", pgid),
                ));
            }

            if !crate::check::process_exists(pid)? {
                return Err(ProcessError::invalid_state(pid.to_string(), "running", "exited"));
            }

            let pgid = crate::check::process_group_of(pid)
                .map_err(|_| ProcessError::invalid_state(pid.to_string(), "running", "exited"))?;
            if pgid != pid {
                return Err(ProcessError::invalid_state(
                    pid.to_string(),
                    "process group leader",
                    format!("member of process group {}", pgid),
                ));
            }

            self.pgid = Some(pgid);
        }

        #[cfg(windows)]
        {
            self.job.assign(child)?;
        }

        debug!("Assigned PID {} to grouping", pid);
        Ok(())
    }

    pub fn is_assigned(&self) -> bool {
        #[cfg(unix)]
        {
            self.pgid.is_some()
        }

        #[cfg(windows)]
        {
            self.job.is_assigned()
        }
    }

    /// Process group id owned by this handle, once assigned.
    #[cfg(unix)]
    pub fn pgid(&self) -> Option<u32> {
        self.pgid
    }

    /// Whether any process assigned to this grouping is still alive.
    ///
    /// An inert grouping has no live members.
    pub fn has_live_members(&self) -> ProcessResult<bool> {
        if !self.is_assigned() || self.observed_empty() {
            return Ok(false);
        }

        #[cfg(unix)]
        let live = match self.pgid {
            Some(pgid) => crate::check::process_group_exists(pgid)?,
            None => false,
        };

        #[cfg(windows)]
        let live = self.job.active_processes()? > 0;

        if !live {
            self.observed_empty.store(true, Ordering::SeqCst);
        }
        Ok(live)
    }

    /// Whether this grouping has been seen empty since assignment.
    pub fn observed_empty(&self) -> bool {
        self.observed_empty.load(Ordering::SeqCst)
    }

    /// Forcefully terminate every process in the grouping, including
    /// descendants spawned after assignment.
    ///
    /// Idempotent. A grouping that is inert or was already seen empty is
    /// left alone.
    pub fn terminate_all(&self) -> ProcessResult<()> {
        if self.observed_empty() {
            debug!("Grouping already empty, nothing to terminate");
            return Ok(());
        }

        #[cfg(unix)]
        {
            match self.pgid {
                Some(pgid) => crate::terminate::kill_process_group(pgid),
                None => Ok(()),
            }
        }

        #[cfg(windows)]
        {
            self.job.terminate()
        }
    }
}

impl Drop for GroupingHandle {
    fn drop(&mut self) {
        if self.policy == ReleasePolicy::KillOnRelease && self.is_assigned() {
            if let Err(e) = self.terminate_all() {
                warn!("Failed to terminate grouping on release: {}", e);
            }
        }

        OUTSTANDING_GROUPINGS.fetch_sub(1, Ordering::SeqCst);
        debug!("Released grouping ({:?})", self.policy);
    }
}
