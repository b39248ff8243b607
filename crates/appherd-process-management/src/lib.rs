//! # appherd Process Management
//!
//! Supervision orchestration for appherd.
//!
//! This crate provides:
//! - [`SupervisionRegistry`] - ordered managed paths mapped to live processes
//! - [`PathStore`] - persistence of the managed-path list
//! - [`Settings`] - supervisor configuration
//! - [`StatusPoller`] and the status reporting types

pub mod config;
pub mod poller;
pub mod registry;
pub mod status;
pub mod store;

pub use config::Settings;
pub use poller::StatusPoller;
pub use registry::{BulkReport, ProcessSlot, SupervisionRegistry};
pub use status::{CommonStatus, EntryState, EntryStatus};
pub use store::{MemoryPathStore, PathStore, TextPathStore};
