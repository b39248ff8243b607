//! "Not found" and "not running" are reported distinctly

#![cfg(unix)]

use appherd_process_management::EntryState;
use e2e_tests::assertions::assert_entry_alive;
use e2e_tests::{test_registry, TestWorkspace};

#[test]
fn test_deleted_target_vs_exited_process() {
    let workspace = TestWorkspace::new("found");
    let deleted = workspace.script("deleted.sh", "exec sleep 300");
    let exited = workspace.script("exited.sh", "exit 0");
    let mut registry = test_registry(&[&deleted, &exited]);

    std::fs::remove_file(deleted.as_path()).unwrap();

    registry.start(&exited).unwrap();
    assert_entry_alive(&mut registry, &exited, false).unwrap();

    let snapshot = registry.list_entries();
    assert_eq!(snapshot.len(), 2);

    assert_eq!(snapshot[0].path, deleted);
    assert!(!snapshot[0].exists_on_disk);
    assert!(!snapshot[0].is_alive);
    assert_eq!(snapshot[0].state(), EntryState::NotFound);

    assert_eq!(snapshot[1].path, exited);
    assert!(snapshot[1].exists_on_disk);
    assert!(!snapshot[1].is_alive);
    assert_eq!(snapshot[1].state(), EntryState::NotActive);
}
