//! Windows Job Object backend for `GroupingHandle`.
//!
//! The job owns the process tree: every process created by an assigned
//! process joins the job automatically. Children are created suspended and
//! resumed only after assignment, so nothing runs outside the job.

use appherd_common::{ProcessError, ProcessResult};
use std::os::windows::io::AsRawHandle;
use std::process::Child;
use tracing::debug;
use windows::core::PCWSTR;
use windows::Win32::Foundation::{CloseHandle, HANDLE};
use windows::Win32::System::Diagnostics::ToolHelp::{
    CreateToolhelp32Snapshot, Thread32First, Thread32Next, TH32CS_SNAPTHREAD, THREADENTRY32,
};
use windows::Win32::System::JobObjects::{
    AssignProcessToJobObject, CreateJobObjectW, JobObjectBasicAccountingInformation,
    JobObjectExtendedLimitInformation, QueryInformationJobObject, SetInformationJobObject,
    TerminateJobObject, JOBOBJECT_BASIC_ACCOUNTING_INFORMATION,
    JOBOBJECT_EXTENDED_LIMIT_INFORMATION, JOB_OBJECT_LIMIT_KILL_ON_JOB_CLOSE,
};
use windows::Win32::System::Threading::{OpenThread, ResumeThread, THREAD_SUSPEND_RESUME};

/// Owned Job Object handle, closed exactly once on drop.
#[derive(Debug)]
pub(crate) struct JobObject {
    handle: HANDLE,
    assigned: bool,
}

// SAFETY: a Job Object HANDLE is an opaque kernel reference; the job APIs
// used here are safe to call from any thread.
unsafe impl Send for JobObject {}
unsafe impl Sync for JobObject {}

impl JobObject {
    pub(crate) fn create(kill_on_close: bool) -> ProcessResult<Self> {
        unsafe {
            let handle = CreateJobObjectW(None, PCWSTR::null()).map_err(|e| {
                ProcessError::resource_exhausted(format!("Failed to create Job Object: {}", e))
            })?;
            let job = Self {
                handle,
                assigned: false,
            };

            if kill_on_close {
                let mut info = JOBOBJECT_EXTENDED_LIMIT_INFORMATION::default();
                info.BasicLimitInformation.LimitFlags = JOB_OBJECT_LIMIT_KILL_ON_JOB_CLOSE;

                SetInformationJobObject(
                    job.handle,
                    JobObjectExtendedLimitInformation,
                    &info as *const _ as *const std::ffi::c_void,
                    std::mem::size_of::<JOBOBJECT_EXTENDED_LIMIT_INFORMATION>() as u32,
                )
                .map_err(|e| {
                    ProcessError::resource_exhausted(format!(
                        "Failed to configure Job Object: {}",
                        e
                    ))
                })?;
            }

            Ok(job)
        }
    }

    pub(crate) fn assign(&mut self, child: &Child) -> ProcessResult<()> {
        let pid = child.id();
        if self.assigned {
            return Err(ProcessError::invalid_state(
                pid.to_string(),
                "unassigned job",
                "job already owns a process",
            ));
        }

        unsafe {
            let process = HANDLE(child.as_raw_handle());
            AssignProcessToJobObject(self.handle, process).map_err(|e| {
                ProcessError::invalid_state(
                    pid.to_string(),
                    "running and unassigned process",
                    format!("assignment refused: {}", e),
                )
            })?;
        }
        self.assigned = true;

        resume_process_threads(pid)
    }

    pub(crate) fn is_assigned(&self) -> bool {
        self.assigned
    }

    pub(crate) fn active_processes(&self) -> ProcessResult<u32> {
        if !self.assigned {
            return Ok(0);
        }

        let mut info = JOBOBJECT_BASIC_ACCOUNTING_INFORMATION::default();
        unsafe {
            QueryInformationJobObject(
                self.handle,
                JobObjectBasicAccountingInformation,
                &mut info as *mut _ as *mut std::ffi::c_void,
                std::mem::size_of::<JOBOBJECT_BASIC_ACCOUNTING_INFORMATION>() as u32,
                None,
            )
            .map_err(|e| ProcessError::query_failed("job", format!("{}", e)))?;
        }
        Ok(info.ActiveProcesses)
    }

    pub(crate) fn terminate(&self) -> ProcessResult<()> {
        if !self.assigned {
            return Ok(());
        }

        debug!("Terminating Job Object");
        unsafe {
            TerminateJobObject(self.handle, 1)
                .map_err(|e| ProcessError::stop_failed("job", format!("TerminateJobObject failed: {}", e)))
        }
    }
}

impl Drop for JobObject {
    fn drop(&mut self) {
        unsafe {
            let _ = CloseHandle(self.handle);
        }
    }
}

/// Resume every thread of a process created with `CREATE_SUSPENDED`.
fn resume_process_threads(pid: u32) -> ProcessResult<()> {
    unsafe {
        let snapshot = CreateToolhelp32Snapshot(TH32CS_SNAPTHREAD, 0).map_err(|e| {
            ProcessError::resource_exhausted(format!("Failed to snapshot threads: {}", e))
        })?;

        let mut entry = THREADENTRY32 {
            dwSize: std::mem::size_of::<THREADENTRY32>() as u32,
            ..Default::default()
        };
        let mut resumed = 0;

        if Thread32First(snapshot, &mut entry).is_ok() {
            loop {
                if entry.th32OwnerProcessID == pid {
                    if let Ok(thread) = OpenThread(THREAD_SUSPEND_RESUME, false, entry.th32ThreadID) {
                        ResumeThread(thread);
                        let _ = CloseHandle(thread);
                        resumed += 1;
                    }
                }
                if Thread32Next(snapshot, &mut entry).is_err() {
                    break;
                }
            }
        }
        let _ = CloseHandle(snapshot);

        if resumed == 0 {
            return Err(ProcessError::launch_failed(
                pid.to_string(),
                "no thread of the suspended process could be resumed",
            ));
        }
        Ok(())
    }
}
