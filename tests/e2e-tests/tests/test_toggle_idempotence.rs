//! Toggle correctness and set_alive idempotence

#![cfg(unix)]

use e2e_tests::assertions::assert_entry_alive;
use e2e_tests::{test_registry, TestWorkspace};

#[test]
fn test_toggle_flips_and_returns() {
    let workspace = TestWorkspace::new("toggle");
    let path = workspace.script("app.sh", "exec sleep 300");
    let mut registry = test_registry(&[&path]);

    assert!(!registry.is_alive(&path));

    assert!(registry.toggle(&path).unwrap());
    assert_entry_alive(&mut registry, &path, true).unwrap();

    assert!(!registry.toggle(&path).unwrap());
    assert_entry_alive(&mut registry, &path, false).unwrap();
}

#[test]
fn test_set_alive_twice_equals_once() {
    let workspace = TestWorkspace::new("idempotent");
    let path = workspace.script("app.sh", "exec sleep 300");
    let mut registry = test_registry(&[&path]);

    registry.set_alive(&path, true).unwrap();
    let pid = registry.process_for(&path).pid();
    registry.set_alive(&path, true).unwrap();
    assert!(registry.is_alive(&path));
    assert_eq!(registry.process_for(&path).pid(), pid, "second start must not relaunch");

    registry.set_alive(&path, false).unwrap();
    assert_entry_alive(&mut registry, &path, false).unwrap();
    registry.set_alive(&path, false).unwrap();
    assert!(!registry.is_alive(&path));
}
