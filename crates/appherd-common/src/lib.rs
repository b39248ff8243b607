//! # appherd Common
//!
//! Common types shared across the appherd crates.
//!
//! This crate provides the foundational pieces every other crate builds
//! upon: the error taxonomy for supervision operations and the
//! `ManagedPath` key that identifies one supervised entry.

pub mod errors;
pub mod types;

// Re-export commonly used items
pub use errors::{Error, ProcessError, ProcessResult, Result, ResultExt};
pub use types::ManagedPath;
