//! Failed launches leave no grouping behind
//!
//! Kept in its own test binary: the handle counter is process-wide.

#![cfg(unix)]

use appherd_common::{ManagedPath, ProcessError};
use appherd_managed_process::outstanding_groupings;
use e2e_tests::{test_launcher, TestWorkspace};

#[test]
fn test_failed_launches_release_their_groupings() {
    let workspace = TestWorkspace::new("launch-failure");
    let launcher = test_launcher();
    let baseline = outstanding_groupings();

    // Missing file: fails before any grouping is created
    let missing = ManagedPath::from(workspace.file("gone.sh").to_string_lossy().into_owned());
    let err = launcher.start(&missing, workspace.path()).unwrap_err();
    assert!(matches!(err, ProcessError::LaunchFailed { .. }));
    assert_eq!(outstanding_groupings(), baseline);

    // Not executable and no resolver: spawn fails after the grouping exists
    let plain = workspace.plain_script("plain.sh", "exit 0");
    let err = launcher.start(&plain, workspace.path()).unwrap_err();
    assert!(matches!(err, ProcessError::LaunchFailed { .. }));
    assert_eq!(outstanding_groupings(), baseline);

    // Success path for comparison
    let app = workspace.script("app.sh", "exec sleep 300");
    let process = launcher.start(&app, workspace.path()).unwrap();
    assert_eq!(outstanding_groupings(), baseline + 1);
    process.kill().unwrap();
    drop(process);
    assert_eq!(outstanding_groupings(), baseline);
}
