//! Process execution primitives.

use std::path::Path;
use std::process::{Command, Stdio};

/// Build a command for `argv` running in `working_directory`.
///
/// Standard streams are detached (null) so the child never shares the
/// supervisor's terminal. Grouping is applied separately through
/// [`crate::GroupingHandle::prepare`].
///
/// Returns `None` when `argv` is empty.
pub fn detached_command<S: AsRef<str>>(argv: &[S], working_directory: &Path) -> Option<Command> {
    let (program, args) = argv.split_first()?;

    let mut cmd = Command::new(program.as_ref());
    cmd.args(args.iter().map(|a| a.as_ref()))
        .current_dir(working_directory)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());
    Some(cmd)
}
