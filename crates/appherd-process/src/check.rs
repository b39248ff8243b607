//! Process and process-group existence checks (Unix).

use appherd_common::{ProcessError, ProcessResult};

/// Check if a process with the given PID exists.
///
/// On Unix this uses `kill(pid, 0)`, which sends no signal. A zombie still
/// counts as existing until its parent reaps it.
#[cfg(unix)]
pub fn process_exists(pid: u32) -> ProcessResult<bool> {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    match kill(Pid::from_raw(pid as i32), None) {
        Ok(_) => Ok(true),
        Err(nix::errno::Errno::ESRCH) => Ok(false),
        // Exists, but owned by someone else
        Err(nix::errno::Errno::EPERM) => Ok(true),
        Err(e) => Err(ProcessError::query_failed(
            pid.to_string(),
            format!("Failed to check process: {}", e),
        )),
    }
}

/// Check if any member of the process group `pgid` is still alive.
///
/// Uses `killpg(pgid, 0)`. `ESRCH` means the group is empty. On Linux a
/// group whose remaining members are all zombies is reported as empty:
/// orphaned members are reparented to an init that may never reap them.
#[cfg(unix)]
pub fn process_group_exists(pgid: u32) -> ProcessResult<bool> {
    use nix::sys::signal::killpg;
    use nix::unistd::Pid;

    match killpg(Pid::from_raw(pgid as i32), None) {
        Ok(_) => Ok(linux::group_has_running_member(pgid).unwrap_or(true)),
        Err(nix::errno::Errno::ESRCH) => Ok(false),
        Err(nix::errno::Errno::EPERM) => Ok(true),
        Err(e) => Err(ProcessError::query_failed(
            format!("pgid {}", pgid),
            format!("Failed to query process group: {}", e),
        )),
    }
}

/// Like [`process_exists`], but a zombie counts as not running (Linux).
#[cfg(unix)]
pub fn process_is_running(pid: u32) -> ProcessResult<bool> {
    if !process_exists(pid)? {
        return Ok(false);
    }
    Ok(linux::read_stat(pid).map_or(true, |stat| !stat.is_zombie()))
}

/// `/proc` based refinements. Elsewhere every query is `None`.
#[cfg(unix)]
mod linux {
    #[derive(Debug, Clone, Copy)]
    pub(super) struct Stat {
        pub state: char,
        pub pgrp: u32,
    }

    impl Stat {
        pub fn is_zombie(&self) -> bool {
            matches!(self.state, 'Z' | 'X')
        }
    }

    /// Parse `state` and `pgrp` out of a `/proc/<pid>/stat` line.
    ///
    /// The command name may contain spaces and parentheses, so fields are
    /// counted from the last `)`.
    pub(super) fn parse_stat(stat: &str) -> Option<Stat> {
        let closing = stat.rfind(')')?;
        let mut fields = stat[closing + 1..].split_whitespace();
        let state = fields.next()?.chars().next()?;
        let _ppid = fields.next()?;
        let pgrp = fields.next()?.parse().ok()?;
        Some(Stat { state, pgrp })
    }

    #[cfg(target_os = "linux")]
    pub(super) fn read_stat(pid: u32) -> Option<Stat> {
        let stat = std::fs::read_to_string(format!("/proc/{}/stat", pid)).ok()?;
        parse_stat(&stat)
    }

    #[cfg(not(target_os = "linux"))]
    pub(super) fn read_stat(_pid: u32) -> Option<Stat> {
        None
    }

    /// Whether the group leader itself is still running in `pgid`.
    #[cfg_attr(not(target_os = "linux"), allow(dead_code))]
    pub(super) fn leader_is_running(pgid: u32) -> bool {
        read_stat(pgid).map_or(false, |stat| stat.pgrp == pgid && !stat.is_zombie())
    }

    /// `Some(true)` if a non-zombie process in `pgid` is found.
    ///
    /// A running leader settles it. `/proc` is only walked once the leader
    /// is gone or a zombie.
    #[cfg(target_os = "linux")]
    pub(super) fn group_has_running_member(pgid: u32) -> Option<bool> {
        if leader_is_running(pgid) {
            return Some(true);
        }

        let entries = std::fs::read_dir("/proc").ok()?;
        let running = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().to_str()?.parse::<u32>().ok())
            .filter_map(read_stat)
            .any(|stat| stat.pgrp == pgid && !stat.is_zombie());
        Some(running)
    }

    #[cfg(not(target_os = "linux"))]
    pub(super) fn group_has_running_member(_pgid: u32) -> Option<bool> {
        None
    }
}

/// Process group the given PID belongs to.
#[cfg(unix)]
pub fn process_group_of(pid: u32) -> ProcessResult<u32> {
    use nix::unistd::{getpgid, Pid};

    getpgid(Some(Pid::from_raw(pid as i32)))
        .map(|pgid| pgid.as_raw() as u32)
        .map_err(|e| {
            ProcessError::query_failed(pid.to_string(), format!("getpgid failed: {}", e))
        })
}
