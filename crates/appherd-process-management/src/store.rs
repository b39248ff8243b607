//! Managed-path persistence.
//!
//! The on-disk format is plain text, one path per line. Loading is lenient:
//! a missing or unreadable file is an empty list, a UTF-8 BOM is ignored,
//! lines are trimmed, blank lines are skipped and duplicates keep their
//! first position.

use appherd_common::{Error, ManagedPath, Result};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// External collaborator holding the ordered set of managed paths.
pub trait PathStore: Send {
    fn load(&self) -> Result<Vec<ManagedPath>>;
    fn save(&self, paths: &[ManagedPath]) -> Result<()>;
}

/// Normalise raw lines into an ordered, duplicate-free path list.
pub fn normalize_lines<'a, I>(lines: I) -> Vec<ManagedPath>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    lines
        .into_iter()
        .map(|line| line.trim_start_matches('\u{feff}').trim())
        .filter(|line| !line.is_empty())
        .filter(|line| seen.insert(line.to_string()))
        .map(ManagedPath::from)
        .collect()
}

/// Text-file store.
#[derive(Debug, Clone)]
pub struct TextPathStore {
    path: PathBuf,
}

impl TextPathStore {
    /// Open a store at `path`, creating its parent directory.
    ///
    /// The file itself is not created until the first save.
    pub fn open<P: Into<PathBuf>>(path: P) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::store(
                        path.display().to_string(),
                        format!("Failed to create directory {}: {}", parent.display(), e),
                    )
                })?;
            }
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PathStore for TextPathStore {
    fn load(&self) -> Result<Vec<ManagedPath>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let paths = normalize_lines(content.lines());
                debug!("Loaded {} managed paths from {}", paths.len(), self.path.display());
                Ok(paths)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("{} does not exist yet, no managed paths", self.path.display());
                Ok(Vec::new())
            }
            Err(e) => {
                warn!("Cannot read {}, treating as empty: {}", self.path.display(), e);
                Ok(Vec::new())
            }
        }
    }

    fn save(&self, paths: &[ManagedPath]) -> Result<()> {
        let mut content = String::new();
        for path in paths {
            content.push_str(path.as_str());
            content.push('\n');
        }

        // Atomic write: temp file, then rename
        let temp_path = self.path.with_extension("tmp");
        let store_error = |e: std::io::Error| Error::store(self.path.display().to_string(), e.to_string());
        std::fs::write(&temp_path, content).map_err(store_error)?;
        std::fs::rename(&temp_path, &self.path).map_err(store_error)?;

        debug!("Saved {} managed paths to {}", paths.len(), self.path.display());
        Ok(())
    }
}

/// In-memory store, applying the same normalisation as the text store.
#[derive(Debug, Default)]
pub struct MemoryPathStore {
    lines: Mutex<Vec<String>>,
}

impl MemoryPathStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: Mutex::new(lines.into_iter().map(Into::into).collect()),
        }
    }
}

impl PathStore for MemoryPathStore {
    fn load(&self) -> Result<Vec<ManagedPath>> {
        let lines = self.lines.lock();
        Ok(normalize_lines(lines.iter().map(String::as_str)))
    }

    fn save(&self, paths: &[ManagedPath]) -> Result<()> {
        *self.lines.lock() = paths.iter().map(|p| p.as_str().to_string()).collect();
        Ok(())
    }
}
