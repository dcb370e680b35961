//! Workspace confinement for filesystem tools.
//!
//! Paths are checked twice. Lexically first: relative paths are joined onto
//! the root, `.` and `..` are folded, and the result must lie under the
//! root. Then on disk: the deepest existing ancestor is canonicalized so a
//! symlink inside the root cannot lead outside it. Absolute paths are
//! accepted only when they already point inside the root.

use std::path::{Component, Path, PathBuf};

use stepwise_core::ToolError;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Confine tools to `root`. Relative roots are taken from the process
    /// working directory; existing roots are canonicalized.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let absolute = if root.is_absolute() {
            root.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(root))
                .unwrap_or_else(|_| root.to_path_buf())
        };
        let root = absolute
            .canonicalize()
            .ok()
            .or_else(|| normalize(&absolute))
            .unwrap_or(absolute);
        Self { root }
    }

    /// A workspace rooted at the process working directory.
    pub fn current_dir() -> std::io::Result<Self> {
        Ok(Self::new(std::env::current_dir()?))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a path requested by `tool` to a location inside the workspace.
    pub fn resolve(&self, tool: &str, path: &str) -> Result<PathBuf, ToolError> {
        let requested = Path::new(path);
        let joined = if requested.is_absolute() {
            requested.to_path_buf()
        } else {
            self.root.join(requested)
        };

        let resolved = normalize(&joined)
            .filter(|lexical| lexical.starts_with(&self.root))
            .and_then(|lexical| canonicalize_existing(&lexical))
            .filter(|canonical| canonical.starts_with(&self.root));

        resolved.ok_or_else(|| {
            warn!(tool, path, root = %self.root.display(), "Path escapes workspace");
            ToolError::PermissionDenied {
                tool_name: tool.into(),
                reason: format!("'{path}' is outside the workspace"),
            }
        })
    }

    /// Path relative to the root, for messages shown to the model.
    pub fn display_path<'a>(&self, path: &'a Path) -> std::borrow::Cow<'a, str> {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
    }
}

/// Fold `.` and `..` without touching the filesystem. `None` if `..`
/// climbs above the filesystem root.
fn normalize(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    return None;
                }
            }
            other => out.push(other),
        }
    }
    Some(out)
}

/// Canonicalize the deepest ancestor that exists (symlinks included, even
/// dangling ones) and re-attach the rest. `None` if that ancestor cannot be
/// canonicalized.
fn canonicalize_existing(path: &Path) -> Option<PathBuf> {
    let existing = path
        .ancestors()
        .find(|ancestor| std::fs::symlink_metadata(ancestor).is_ok())?;
    let rest = path.strip_prefix(existing).ok()?;
    let canonical = existing.canonicalize().ok()?;
    Some(if rest.as_os_str().is_empty() {
        canonical
    } else {
        canonical.join(rest)
    })
}
