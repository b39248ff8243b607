//! Core domain types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Filesystem path identifying one entry under management.
///
/// Equality is plain string equality; no canonicalization is applied.
///
/// # Example
/// ```
/// use appherd_common::ManagedPath;
///
/// let path = ManagedPath::from("/opt/tools/app.sh");
/// assert_eq!(path.as_str(), "/opt/tools/app.sh");
/// assert_eq!(path.file_name(), "app.sh");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManagedPath(String);

impl ManagedPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }

    /// Whether the target currently exists on the filesystem.
    ///
    /// Checked independently of any process liveness.
    pub fn exists_on_disk(&self) -> bool {
        self.as_path().exists()
    }

    /// Last path component, or the whole path when there is none.
    pub fn file_name(&self) -> &str {
        self.as_path()
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.0)
    }

    /// Directory the entry is launched from.
    pub fn working_directory(&self) -> PathBuf {
        match self.as_path().parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

impl From<&str> for ManagedPath {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ManagedPath {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<Path> for ManagedPath {
    fn as_ref(&self) -> &Path {
        self.as_path()
    }
}

impl fmt::Display for ManagedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
