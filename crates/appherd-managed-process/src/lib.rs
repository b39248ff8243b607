//! # appherd Managed Process
//!
//! Launching and owning supervised processes.
//!
//! This crate provides:
//! - [`CommandResolver`] - collaborator interface turning a non-executable
//!   file into a command line, plus the association-table implementation
//! - [`Launcher`] - starts a process inside a fresh grouping construct
//! - [`ManagedProcess`] - one supervised instance: liveness and whole-tree kill
//!
//! **Architecture:**
//! ```text
//! SupervisionRegistry (orchestration, in appherd-process-management)
//!       ↓ uses
//! Launcher ── CommandResolver
//!       ↓ creates
//! ManagedProcess ── GroupingHandle (appherd-process)
//! ```

pub mod launcher;
pub mod liveness;
pub mod managed_process;
pub mod resolver;

pub use launcher::{is_directly_executable, Launcher};
pub use managed_process::ManagedProcess;
pub use resolver::{
    default_associations, expand_template, AssociationResolver, CommandResolver, NoopResolver,
};

// Grouping types are part of the launcher's configuration surface
pub use appherd_process::{outstanding_groupings, ReleasePolicy};
