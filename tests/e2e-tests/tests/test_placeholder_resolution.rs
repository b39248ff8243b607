//! Non-executable files are launched through association templates

#![cfg(unix)]

use appherd_managed_process::{AssociationResolver, Launcher, ReleasePolicy};
use e2e_tests::{wait_until, TestWorkspace, DEFAULT_TIMEOUT};
use std::sync::Arc;

#[test]
fn test_default_association_runs_plain_script() {
    let workspace = TestWorkspace::new("assoc");
    let marker = workspace.file("ran.txt");
    let path = workspace.plain_script("job.sh", &format!("echo ok > '{}'", marker.display()));

    let launcher = Launcher::new(Arc::new(AssociationResolver::with_defaults()))
        .with_release_policy(ReleasePolicy::KillOnRelease);
    assert_eq!(launcher.resolve(&path).unwrap(), vec!["/bin/sh".to_string(), path.as_str().to_string()]);

    let process = launcher.start(&path, workspace.path()).unwrap();
    assert!(wait_until(DEFAULT_TIMEOUT, || marker.exists()));
    assert!(wait_until(DEFAULT_TIMEOUT, || !process.is_alive()));
}

#[test]
fn test_extra_argument_placeholders_are_dropped() {
    let workspace = TestWorkspace::new("extra-args");
    let marker = workspace.file("args.txt");
    let path = workspace.plain_script("job.task", &format!("echo \"$#\" > '{}'", marker.display()));

    let resolver = AssociationResolver::new().associate(".task", r#"/bin/sh "%1" %* %2"#);
    let launcher = Launcher::new(Arc::new(resolver));

    let argv = launcher.resolve(&path).unwrap();
    assert_eq!(argv, vec!["/bin/sh".to_string(), path.as_str().to_string()]);
    assert!(argv.iter().all(|token| !token.contains('%')));

    let process = launcher.start(&path, workspace.path()).unwrap();
    assert!(wait_until(DEFAULT_TIMEOUT, || {
        std::fs::read_to_string(&marker).map(|s| s.trim() == "0").unwrap_or(false)
    }));
    drop(process);
}
