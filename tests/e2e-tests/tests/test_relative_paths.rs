//! Entries registered with a relative path that has a directory part
//!
//! The child runs in the entry's own directory, so the invocation must not
//! be resolved a second time from there.

#![cfg(unix)]

use appherd_managed_process::{AssociationResolver, Launcher, ReleasePolicy};
use appherd_process_management::{MemoryPathStore, SupervisionRegistry};
use e2e_tests::assertions::{assert_entry_alive, assert_pid_running, assert_pid_terminated};
use e2e_tests::{read_pid_file, test_registry, wait_until, TestWorkspace, DEFAULT_TIMEOUT};
use std::sync::Arc;

#[test]
fn test_relative_executable_starts_and_stops() {
    let workspace = TestWorkspace::new_in_current_dir("relative");
    workspace.tree_script("app.sh");
    let path = workspace.relative("app.sh");
    assert!(path.as_path().is_relative());

    let mut registry = test_registry(&[&path]);
    registry.start(&path).unwrap();
    assert_entry_alive(&mut registry, &path, true).unwrap();

    let child = read_pid_file(&workspace.child_pid_file("app.sh"), DEFAULT_TIMEOUT).unwrap();
    assert_pid_running(child, "background child").unwrap();

    // Registry key stays exactly as registered
    assert_eq!(registry.entries(), &[path.clone()]);

    registry.kill(&path).unwrap();
    assert_entry_alive(&mut registry, &path, false).unwrap();
    assert_pid_terminated(child, "background child").unwrap();
}

#[test]
fn test_relative_plain_script_goes_through_association() {
    let workspace = TestWorkspace::new_in_current_dir("relative-assoc");
    workspace.plain_script("job.sh", "echo ok > ran.txt\nexec sleep 300");
    let path = workspace.relative("job.sh");
    let marker = workspace.file("ran.txt");

    let launcher = Launcher::new(Arc::new(AssociationResolver::with_defaults()))
        .with_release_policy(ReleasePolicy::KillOnRelease);
    let argv = launcher.resolve(&path).unwrap();
    assert_eq!(argv[0], "/bin/sh");
    assert!(std::path::Path::new(&argv[1]).is_absolute());

    let store = MemoryPathStore::with_lines([path.as_str().to_string()]);
    let mut registry = SupervisionRegistry::open(store, launcher).unwrap();
    registry.start(&path).unwrap();

    // Ran in its own directory
    assert!(wait_until(DEFAULT_TIMEOUT, || marker.exists()));
    assert_entry_alive(&mut registry, &path, true).unwrap();

    registry.kill(&path).unwrap();
    assert_entry_alive(&mut registry, &path, false).unwrap();
}
