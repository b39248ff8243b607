//! # appherd Process
//!
//! Low-level OS primitives for supervising process trees.
//!
//! This crate provides cross-platform pieces for:
//! - Grouping constructs that own a whole process tree ([`GroupingHandle`])
//! - Group liveness probing
//! - Whole-group forceful termination
//! - Building detached child commands
//!
//! On Unix the grouping construct is a process group led by the launched
//! child (created with `setsid()` before `exec`). On Windows it is a Job
//! Object the child is assigned to while still suspended.

pub mod check;
pub mod execute;
pub mod grouping;
pub mod terminate;

#[cfg(windows)]
mod grouping_windows;

// Re-export main types
pub use check::*;
pub use execute::*;
pub use grouping::{outstanding_groupings, GroupingHandle, ReleasePolicy};
pub use terminate::*;
