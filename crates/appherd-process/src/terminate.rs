//! Process group termination primitives.
//!
//! Termination is immediate and forceful: there is no interrupt-then-wait
//! grace period.

use appherd_common::{ProcessError, ProcessResult};
use tracing::{debug, error};

/// Send `SIGKILL` to every member of the process group `pgid`.
///
/// `ESRCH` (group already empty) and `EPERM` (members already gone or
/// re-owned) are treated as success, so repeated calls are no-ops.
#[cfg(unix)]
pub fn kill_process_group(pgid: u32) -> ProcessResult<()> {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    debug!("Sending SIGKILL to process group {}", pgid);

    match killpg(Pid::from_raw(pgid as i32), Signal::SIGKILL) {
        Ok(()) => {
            debug!("Successfully sent SIGKILL to process group {}", pgid);
            Ok(())
        }
        Err(nix::errno::Errno::ESRCH) => {
            debug!("Process group {} already exited", pgid);
            Ok(())
        }
        Err(nix::errno::Errno::EPERM) => {
            debug!(
                "Permission denied signaling process group {} (likely already exited)",
                pgid
            );
            Ok(())
        }
        Err(e) => {
            error!("Failed to send SIGKILL to process group {}: {}", pgid, e);
            Err(ProcessError::stop_failed(
                format!("pgid {}", pgid),
                format!("Failed to send SIGKILL: {}", e),
            ))
        }
    }
}
