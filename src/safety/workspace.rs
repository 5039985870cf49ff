use std::path::{Component, Path, PathBuf};

/// Confines every tool path to the project root.
///
/// Paths are normalized lexically first (so `a/../../x` is caught without
/// touching the disk), then the deepest existing ancestor is canonicalized to
/// catch symlinks that point outside the root.
#[derive(Debug, Clone)]
pub struct WorkspaceGuard {
    /// Canonical (absolute, symlinks resolved) project root.
    canonical_root: PathBuf,
}

impl WorkspaceGuard {
    /// Create a guard for an existing project directory.
    pub fn new(project_root: &Path) -> std::io::Result<Self> {
        let canonical_root = std::fs::canonicalize(project_root)?;
        Ok(Self { canonical_root })
    }

    /// Resolve a tool-supplied path (relative to the root, or absolute) to an
    /// absolute path inside the root. Returns `None` if it escapes.
    pub fn resolve(&self, path: &str) -> Option<PathBuf> {
        let candidate = Path::new(path);
        let joined = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.canonical_root.join(candidate)
        };

        let normalized = normalize(&joined)?;
        if !normalized.starts_with(&self.canonical_root) {
            return None;
        }

        let (existing, rest) = split_existing(&normalized);
        let canonical_existing = std::fs::canonicalize(existing).ok()?;
        if !canonical_existing.starts_with(&self.canonical_root) {
            return None;
        }

        Some(canonical_existing.join(rest))
    }

    /// Get the canonical project root path.
    pub fn canonical_root(&self) -> &Path {
        &self.canonical_root
    }
}

/// Lexically collapse `.` and `..`. Returns `None` if `..` climbs past the
/// filesystem root.
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
            other => out.push(other.as_os_str()),
        }
    }
    Some(out)
}

/// Split an absolute path into its deepest existing ancestor and the
/// remaining (not yet created) tail. A symlink counts as existing even when
/// its target does not, so it is always canonicalized.
fn split_existing(path: &Path) -> (&Path, PathBuf) {
    let mut existing = path;
    let mut tail = Vec::new();
    while std::fs::symlink_metadata(existing).is_err() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                tail.push(name.to_os_string());
                existing = parent;
            }
            _ => break,
        }
    }
    let rest = tail.iter().rev().collect::<PathBuf>();
    (existing, rest)
}
