//! Custom assertions for E2E tests

use crate::{pid_running, wait_until, DEFAULT_TIMEOUT};
use appherd_common::ManagedPath;
use appherd_process_management::SupervisionRegistry;

/// Assert that the process with `pid` terminates within the default timeout
pub fn assert_pid_terminated(pid: u32, what: &str) -> Result<(), String> {
    if wait_until(DEFAULT_TIMEOUT, || !pid_running(pid)) {
        Ok(())
    } else {
        Err(format!("{} (PID {}) is still running", what, pid))
    }
}

/// Assert that `pid` is running right now
pub fn assert_pid_running(pid: u32, what: &str) -> Result<(), String> {
    if pid_running(pid) {
        Ok(())
    } else {
        Err(format!("{} (PID {}) is not running", what, pid))
    }
}

/// Assert that the registry eventually reports `path` in the given state
pub fn assert_entry_alive(
    registry: &mut SupervisionRegistry,
    path: &ManagedPath,
    expected: bool,
) -> Result<(), String> {
    if wait_until(DEFAULT_TIMEOUT, || registry.is_alive(path) == expected) {
        Ok(())
    } else {
        Err(format!(
            "{} expected alive={}, registry reports alive={}",
            path,
            expected,
            registry.is_alive(path)
        ))
    }
}
