//! Whole-tree termination
//!
//! Killing a managed entry must take down every process it spawned, not
//! only the directly launched one.

#![cfg(unix)]

use e2e_tests::assertions::{assert_entry_alive, assert_pid_running, assert_pid_terminated};
use e2e_tests::{read_pid_file, test_launcher, test_registry, TestWorkspace, DEFAULT_TIMEOUT};

#[test]
fn test_kill_terminates_spawned_children() {
    println!("\n========================================");
    println!("TEST: Whole-tree termination on kill");
    println!("========================================\n");

    let workspace = TestWorkspace::new("tree-kill");
    let path = workspace.tree_script("tree.sh");
    let mut registry = test_registry(&[&path]);

    let result = (|| -> Result<(), String> {
        println!("Step 1: Starting tree script...");
        registry.start(&path).map_err(|e| e.to_string())?;
        let parent = read_pid_file(&workspace.parent_pid_file("tree.sh"), DEFAULT_TIMEOUT)?;
        let child = read_pid_file(&workspace.child_pid_file("tree.sh"), DEFAULT_TIMEOUT)?;
        assert_pid_running(parent, "launched script")?;
        assert_pid_running(child, "spawned child")?;
        println!("✓ Script {} and child {} are running\n", parent, child);

        println!("Step 2: Killing entry...");
        registry.kill(&path).map_err(|e| e.to_string())?;
        assert_pid_terminated(parent, "launched script")?;
        assert_pid_terminated(child, "spawned child")?;
        assert_entry_alive(&mut registry, &path, false)?;
        println!("✓ Whole tree terminated\n");
        Ok(())
    })();

    if let Err(e) = result {
        panic!("Test failed: {}", e);
    }
}

#[test]
fn test_entry_stays_alive_after_launcher_exits() {
    let workspace = TestWorkspace::new("launcher-exit");
    let path = workspace.launcher_script("launch.sh");
    let mut registry = test_registry(&[&path]);

    registry.start(&path).unwrap();
    let child = read_pid_file(&workspace.child_pid_file("launch.sh"), DEFAULT_TIMEOUT).unwrap();

    // The launcher is gone but its child keeps the group alive
    std::thread::sleep(std::time::Duration::from_millis(300));
    assert!(registry.is_alive(&path), "entry should be alive while its child runs");

    registry.kill(&path).unwrap();
    assert_pid_terminated(child, "orphaned child").unwrap();
    assert_entry_alive(&mut registry, &path, false).unwrap();
}

#[test]
fn test_release_kills_tree() {
    let workspace = TestWorkspace::new("release");
    let path = workspace.tree_script("tree.sh");

    let process = test_launcher().start(&path, workspace.path()).unwrap();
    let child = read_pid_file(&workspace.child_pid_file("tree.sh"), DEFAULT_TIMEOUT).unwrap();
    assert_pid_running(child, "spawned child").unwrap();

    drop(process);
    assert_pid_terminated(child, "spawned child").unwrap();
}
