//! Command resolution for files that are not directly executable.
//!
//! A resolver maps a file to the command line the host would use to open
//! it. Templates follow file-association expansion rules:
//!
//! - `%1`, `%l` and `%L` are replaced by the literal file path
//! - tokens asking for extra arguments (`%*`, `%2`..`%9`) are dropped,
//!   since the supervisor never has any to supply
//! - `%%` escapes a literal percent sign and never starts a placeholder

use appherd_common::{ProcessError, ProcessResult};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Collaborator translating a file path into a command line.
///
/// `None` means "invoke the path directly". `Some(argv)` carries the
/// tokens with the path already substituted.
pub trait CommandResolver: Send + Sync {
    fn resolve(&self, path: &Path) -> Option<Vec<String>>;
}

impl<F> CommandResolver for F
where
    F: Fn(&Path) -> Option<Vec<String>> + Send + Sync,
{
    fn resolve(&self, path: &Path) -> Option<Vec<String>> {
        self(path)
    }
}

/// Resolver that never resolves anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopResolver;

impl CommandResolver for NoopResolver {
    fn resolve(&self, _path: &Path) -> Option<Vec<String>> {
        None
    }
}

/// Expand an open-command template for `path`.
///
/// Fails with `LaunchFailed` when the template cannot be tokenised
/// (for example an unbalanced quote).
pub fn expand_template(template: &str, path: &Path) -> ProcessResult<Vec<String>> {
    let path_str = path.to_string_lossy();
    let tokens = shell_words::split(template).map_err(|e| {
        ProcessError::launch_failed(
            path_str.as_ref(),
            format!("malformed command template '{}': {}", template, e),
        )
    })?;

    Ok(tokens
        .into_iter()
        .filter(|token| !requests_extra_arguments(token))
        .map(|token| substitute_file_placeholders(&token, &path_str))
        .collect())
}

fn substitute_file_placeholders(token: &str, path: &str) -> String {
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some('1') | Some('l') | Some('L') => {
                chars.next();
                out.push_str(path);
            }
            Some('%') => {
                chars.next();
                out.push_str("%%");
            }
            _ => out.push('%'),
        }
    }
    out
}

fn requests_extra_arguments(token: &str) -> bool {
    let bytes = token.as_bytes();
    let mut i = 0;
    while i + 1 < bytes.len() {
        if bytes[i] == b'%' {
            match bytes[i + 1] {
                b'%' => {
                    i += 2;
                    continue;
                }
                b'*' | b'2'..=b'9' => return true,
                _ => {}
            }
        }
        i += 1;
    }
    false
}

/// Built-in extension → template table for the current platform.
pub fn default_associations() -> Vec<(&'static str, &'static str)> {
    #[cfg(windows)]
    {
        vec![
            (".lnk", r#"cmd.exe /C start "" "%1""#),
            (".url", r#"cmd.exe /C start "" "%1""#),
            (".bat", r#"cmd.exe /C "%1""#),
            (".cmd", r#"cmd.exe /C "%1""#),
        ]
    }

    #[cfg(not(windows))]
    {
        vec![(".sh", r#"/bin/sh "%1""#)]
    }
}

/// Resolver backed by an extension → template table.
///
/// Extensions are matched case-insensitively and include the leading dot.
#[derive(Debug, Clone, Default)]
pub struct AssociationResolver {
    templates: HashMap<String, String>,
    fallback: Option<String>,
}

impl AssociationResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver preloaded with [`default_associations`].
    pub fn with_defaults() -> Self {
        default_associations()
            .into_iter()
            .fold(Self::new(), |resolver, (ext, template)| {
                resolver.associate(ext, template)
            })
    }

    pub fn associate(mut self, extension: &str, template: impl Into<String>) -> Self {
        self.templates
            .insert(extension.to_lowercase(), template.into());
        self
    }

    /// Template used for extensions with no entry of their own.
    pub fn with_fallback(mut self, template: impl Into<String>) -> Self {
        self.fallback = Some(template.into());
        self
    }

    pub fn template_for(&self, path: &Path) -> Option<&str> {
        let by_extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.templates.get(&format!(".{}", ext.to_lowercase())));

        by_extension.or(self.fallback.as_ref()).map(String::as_str)
    }
}

impl CommandResolver for AssociationResolver {
    fn resolve(&self, path: &Path) -> Option<Vec<String>> {
        let template = self.template_for(path)?;
        match expand_template(template, path) {
            Ok(argv) if !argv.is_empty() => {
                debug!("Resolved {} via template {:?}", path.display(), template);
                Some(argv)
            }
            Ok(_) => {
                warn!("Template {:?} expanded to an empty command line", template);
                None
            }
            Err(e) => {
                warn!("{}", e);
                None
            }
        }
    }
}
