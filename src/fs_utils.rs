//! Cross-platform filesystem utilities
//!
//! - `normalize_path`: Strips Windows `\\?\` prefix from canonicalized paths
//! - `atomic_rename` / `write_atomic`: Replace a file without leaving it half-written
//! - `get_config_base_dir`: Returns the platform configuration directory

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Normalize Windows paths by removing the `\\?\` prefix if present.
///
/// `Path::canonicalize()` returns extended-length paths on Windows, which
/// breaks comparisons between member files and database paths coming from
/// the host. This is a no-op on Unix.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use continuum::fs_utils::normalize_path;
///
/// let path = PathBuf::from("/home/user/project");
/// assert_eq!(normalize_path(&path), path);
/// ```
pub fn normalize_path(path: &Path) -> PathBuf {
    #[cfg(windows)]
    {
        let s = path.to_string_lossy();
        if let Some(stripped) = s.strip_prefix(r"\\?\UNC\") {
            return PathBuf::from(format!(r"\\{}", stripped));
        }
        if let Some(stripped) = s.strip_prefix(r"\\?\") {
            return PathBuf::from(stripped);
        }
    }
    path.to_path_buf()
}

/// Cross-platform atomic rename that handles Windows file replacement.
///
/// On Windows, `fs::rename` fails if the target exists, so the target is
/// removed first.
pub fn atomic_rename(src: &Path, dst: &Path) -> io::Result<()> {
    #[cfg(windows)]
    {
        if dst.exists() {
            fs::remove_file(dst)?;
        }
    }
    fs::rename(src, dst)
}

/// Write `data` to `path` through a temporary sibling file followed by a rename.
///
/// The parent directory must already exist.
pub fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, data)?;
    atomic_rename(&tmp_path, path)
}

/// Get the platform configuration directory for continuum.
///
/// - **Windows**: `%APPDATA%\continuum`
/// - **Unix**: `$XDG_CONFIG_HOME/continuum` or `~/.config/continuum`
/// - **Fallback**: System temp directory + `continuum`
pub fn get_config_base_dir() -> PathBuf {
    if let Some(dir) = dirs::config_dir() {
        return dir.join("continuum");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".config").join("continuum");
    }
    std::env::temp_dir().join("continuum")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_normalize_path_preserves_regular_paths() {
        let unix_path = PathBuf::from("/home/user/project");
        assert_eq!(normalize_path(&unix_path), unix_path);

        let windows_path = PathBuf::from(r"C:\Users\Test\project");
        assert_eq!(normalize_path(&windows_path), windows_path);
    }

    #[test]
    #[cfg(windows)]
    fn test_normalize_path_strips_windows_prefix() {
        let prefixed = PathBuf::from(r"\\?\C:\Users\Test\project");
        assert_eq!(
            normalize_path(&prefixed),
            PathBuf::from(r"C:\Users\Test\project")
        );

        let unc_prefixed = PathBuf::from(r"\\?\UNC\server\share\path");
        assert_eq!(
            normalize_path(&unc_prefixed),
            PathBuf::from(r"\\server\share\path")
        );
    }

    #[test]
    fn test_get_config_base_dir_contains_continuum() {
        let dir = get_config_base_dir();
        assert!(
            dir.to_string_lossy().contains("continuum"),
            "Config dir should contain 'continuum': {:?}",
            dir
        );
    }

    #[test]
    fn test_write_atomic_replaces_existing() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("project.conf");

        fs::write(&target, "old content").unwrap();
        write_atomic(&target, b"new content").unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "new content");
        assert!(
            !dir.path().join("project.tmp").exists(),
            "Temporary file should be renamed away"
        );
    }

    #[test]
    fn test_atomic_rename_creates_file() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("source.txt");
        let dst = dir.path().join("dest.txt");

        fs::write(&src, "test content").unwrap();
        atomic_rename(&src, &dst).unwrap();

        assert!(!src.exists(), "Source should not exist after rename");
        assert_eq!(fs::read_to_string(&dst).unwrap(), "test content");
    }
}
