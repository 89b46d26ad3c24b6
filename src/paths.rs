//! Path resolution shared by the CLI and the session controller

use std::path::{Path, PathBuf};

use crate::fs_utils::normalize_path;
use crate::Result;

/// Resolve path from `Option<PathBuf>`, defaulting to CWD if None.
///
/// Relative paths are joined with the current working directory.
pub fn resolve_pathbuf(path: Option<&PathBuf>) -> Result<PathBuf> {
    let cwd = std::env::current_dir()?;
    Ok(match path {
        Some(p) if p.is_absolute() => p.clone(),
        Some(p) => cwd.join(p),
        None => cwd,
    })
}

/// Canonicalize path for consistent comparison.
///
/// Resolves symlinks and strips the Windows extended-length prefix. If
/// canonicalization fails (e.g. the path doesn't exist), returns the
/// original path unchanged.
pub fn canonicalize_path(path: &Path) -> PathBuf {
    path.canonicalize()
        .map(|p| normalize_path(&p))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Canonicalize the directory part of a file path, keeping its file name.
///
/// Binaries reported by a host may be relative or reached through a
/// symlinked directory; this maps them onto the same tree as a canonical
/// project root. A symlinked file keeps its own name.
pub fn canonicalize_parent(path: &Path) -> PathBuf {
    let Some(name) = path.file_name() else {
        return canonicalize_path(path);
    };
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    canonicalize_path(parent).join(name)
}
