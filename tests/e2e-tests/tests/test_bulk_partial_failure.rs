//! Bulk operations attempt every entry

#![cfg(unix)]

use appherd_common::{ManagedPath, ProcessError};
use e2e_tests::assertions::assert_entry_alive;
use e2e_tests::{test_registry, TestWorkspace};

#[test]
fn test_run_all_with_one_missing_file() {
    let workspace = TestWorkspace::new("bulk");
    let first = workspace.script("first.sh", "exec sleep 300");
    let missing = ManagedPath::from(workspace.file("missing.sh").to_string_lossy().into_owned());
    let last = workspace.script("last.sh", "exec sleep 300");
    let mut registry = test_registry(&[&first, &missing, &last]);

    let report = registry.set_all_alive(true);
    assert_eq!(report.succeeded, vec![first.clone(), last.clone()]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, missing);
    assert!(matches!(report.failed[0].1, ProcessError::LaunchFailed { .. }));

    assert_entry_alive(&mut registry, &first, true).unwrap();
    assert_entry_alive(&mut registry, &last, true).unwrap();
    assert!(!registry.is_alive(&missing));

    let report = registry.set_all_alive(false);
    assert!(report.is_complete());
    assert_entry_alive(&mut registry, &first, false).unwrap();
    assert_entry_alive(&mut registry, &last, false).unwrap();
}
