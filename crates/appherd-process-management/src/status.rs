//! Status reporting types.

use appherd_common::ManagedPath;
use std::fmt;

/// Point-in-time view of one managed entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryStatus {
    pub path: ManagedPath,
    pub exists_on_disk: bool,
    pub is_alive: bool,
    /// PID of the directly launched process while the entry is running
    pub pid: Option<u32>,
}

impl EntryStatus {
    pub fn state(&self) -> EntryState {
        EntryState::of(self.exists_on_disk, self.is_alive)
    }
}

/// Displayed state of an entry. A missing file wins over liveness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryState {
    NotFound,
    Active,
    NotActive,
}

impl EntryState {
    pub fn of(exists_on_disk: bool, is_alive: bool) -> Self {
        match (exists_on_disk, is_alive) {
            (false, _) => EntryState::NotFound,
            (true, true) => EntryState::Active,
            (true, false) => EntryState::NotActive,
        }
    }
}

impl fmt::Display for EntryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            EntryState::NotFound => "NOT FOUND",
            EntryState::Active => "ACTIVE",
            EntryState::NotActive => "NOT ACTIVE",
        })
    }
}

/// Summary over a whole snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommonStatus {
    /// No entry exists on disk (including the empty list)
    NothingFound,
    AllActive,
    AllInactive,
    Partial { active: usize, total: usize },
}

impl CommonStatus {
    pub fn from_snapshot(snapshot: &[EntryStatus]) -> Self {
        if snapshot.iter().all(|s| !s.exists_on_disk) {
            return CommonStatus::NothingFound;
        }

        let total = snapshot.len();
        let active = snapshot.iter().filter(|s| s.is_alive).count();
        match active {
            0 => CommonStatus::AllInactive,
            n if n == total => CommonStatus::AllActive,
            _ => CommonStatus::Partial { active, total },
        }
    }
}

impl fmt::Display for CommonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommonStatus::NothingFound => write!(f, "NOTHING FOUND"),
            CommonStatus::AllActive => write!(f, "ALL ACTIVE"),
            CommonStatus::AllInactive => write!(f, "ALL INACTIVE"),
            CommonStatus::Partial { active, total } => {
                write!(f, "PARTIAL ACTIVE ({}/{})", active, total)
            }
        }
    }
}
