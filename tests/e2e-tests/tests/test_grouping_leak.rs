//! Grouping resource leak check
//!
//! Repeated start/kill cycles on one path must not accumulate grouping
//! handles. Kept in its own test binary: the handle counter is process-wide.

#![cfg(unix)]

use appherd_managed_process::outstanding_groupings;
use e2e_tests::assertions::assert_entry_alive;
use e2e_tests::{test_registry, TestWorkspace};

const CYCLES: usize = 100;

#[test]
fn test_start_kill_cycles_do_not_leak_groupings() {
    let workspace = TestWorkspace::new("leak");
    let path = workspace.script("app.sh", "exec sleep 300");
    let mut registry = test_registry(&[&path]);
    let baseline = outstanding_groupings();

    for cycle in 0..CYCLES {
        registry.start(&path).unwrap();
        assert!(registry.is_alive(&path), "cycle {}: not alive after start", cycle);
        assert_eq!(outstanding_groupings(), baseline + 1, "cycle {}", cycle);

        registry.kill(&path).unwrap();
        assert_entry_alive(&mut registry, &path, false).unwrap();
        // The dead instance is dropped once observed dead
        assert_eq!(outstanding_groupings(), baseline, "cycle {}", cycle);
    }

    drop(registry);
    assert_eq!(outstanding_groupings(), baseline);
}
