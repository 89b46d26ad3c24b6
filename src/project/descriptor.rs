//! Project descriptor store
//!
//! The descriptor lives at `<root>/.continuum/project.conf` and is a small
//! line-oriented `key=value` document:
//!
//! ```text
//! [project]
//! filePatterns=*.exe;*.dll
//! ```
//!
//! Only `filePatterns` is required. Other keys are kept as-is so newer
//! writers can add settings without breaking older readers.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{CONFIG_FILE_NAME, META_DIR_NAME};
use crate::error::{ContinuumError, Result};
use crate::fs_utils::write_atomic;

/// Key holding the member file patterns
pub const FILE_PATTERNS_KEY: &str = "filePatterns";

/// Key written by older plugin versions
const LEGACY_FILE_PATTERNS_KEY: &str = "file_patterns";

const SECTION: &str = "project";

/// Parsed project configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectConfig {
    file_patterns: String,
    entries: BTreeMap<String, String>,
}

impl ProjectConfig {
    pub fn new(file_patterns: impl Into<String>) -> Self {
        let file_patterns = file_patterns.into();
        let mut entries = BTreeMap::new();
        entries.insert(FILE_PATTERNS_KEY.to_string(), file_patterns.clone());
        Self {
            file_patterns,
            entries,
        }
    }

    /// Raw semicolon-separated pattern list
    pub fn file_patterns(&self) -> &str {
        &self.file_patterns
    }

    /// Any key stored in the descriptor
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn parse(path: &Path, text: &str) -> Result<Self> {
        let mut entries = BTreeMap::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            if line.starts_with('[') && line.ends_with(']') {
                continue;
            }
            let Some((key, value)) = line.split_once('=').or_else(|| line.split_once(':'))
            else {
                tracing::warn!(
                    "[PROJECT] Ignoring malformed line in {}: {}",
                    path.display(),
                    line
                );
                continue;
            };
            entries.insert(key.trim().to_string(), value.trim().to_string());
        }

        let file_patterns = entries
            .get(FILE_PATTERNS_KEY)
            .or_else(|| entries.get(LEGACY_FILE_PATTERNS_KEY))
            .cloned()
            .ok_or_else(|| ContinuumError::ConfigIncomplete {
                path: path.to_path_buf(),
                key: FILE_PATTERNS_KEY.to_string(),
            })?;

        Ok(Self {
            file_patterns,
            entries,
        })
    }

    fn render(&self) -> String {
        let mut out = format!("[{}]\n", SECTION);
        out.push_str(&format!("{}={}\n", FILE_PATTERNS_KEY, self.file_patterns));
        for (key, value) in &self.entries {
            if key != FILE_PATTERNS_KEY && key != LEGACY_FILE_PATTERNS_KEY {
                out.push_str(&format!("{}={}\n", key, value));
            }
        }
        out
    }
}

/// Path of the metadata directory for a project root
pub fn meta_dir(root: &Path) -> PathBuf {
    root.join(META_DIR_NAME)
}

/// Path of the descriptor file for a project root
pub fn descriptor_path(root: &Path) -> PathBuf {
    meta_dir(root).join(CONFIG_FILE_NAME)
}

/// Load the descriptor of the project at `root`.
pub fn load(root: &Path) -> Result<ProjectConfig> {
    let path = descriptor_path(root);
    match fs::read_to_string(&path) {
        Ok(text) => ProjectConfig::parse(&path, &text),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(ContinuumError::ConfigMissing { path }),
        Err(e) => Err(ContinuumError::Io(e)),
    }
}

/// Create the metadata directory and descriptor for a new project at `root`.
///
/// Refuses to touch a root that already has a metadata directory.
pub fn create(root: &Path, file_patterns: &str) -> Result<ProjectConfig> {
    let dir = meta_dir(root);
    match fs::create_dir(&dir) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            return Err(ContinuumError::AlreadyAProject {
                path: root.to_path_buf(),
            })
        }
        Err(e) => return Err(ContinuumError::Io(e)),
    }

    let config = ProjectConfig::new(file_patterns);
    write_atomic(&descriptor_path(root), config.render().as_bytes())?;
    tracing::info!(
        "[PROJECT] Created project descriptor in {} ({})",
        dir.display(),
        file_patterns
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_then_load() {
        let dir = tempdir().unwrap();
        create(dir.path(), "*.exe;*.dll").unwrap();

        let text = fs::read_to_string(descriptor_path(dir.path())).unwrap();
        assert!(text.contains("filePatterns=*.exe;*.dll"), "got: {text}");

        let config = load(dir.path()).unwrap();
        assert_eq!(config.file_patterns(), "*.exe;*.dll");
    }

    #[test]
    fn test_load_without_meta_dir() {
        let dir = tempdir().unwrap();
        let err = load(dir.path()).unwrap_err();
        assert!(matches!(err, ContinuumError::ConfigMissing { .. }));
    }

    #[test]
    fn test_load_meta_dir_without_descriptor() {
        let dir = tempdir().unwrap();
        fs::create_dir(meta_dir(dir.path())).unwrap();
        let err = load(dir.path()).unwrap_err();
        assert!(matches!(err, ContinuumError::ConfigMissing { .. }));
    }

    #[test]
    fn test_load_without_file_patterns() {
        let dir = tempdir().unwrap();
        fs::create_dir(meta_dir(dir.path())).unwrap();
        fs::write(descriptor_path(dir.path()), "[project]\nname=demo\n").unwrap();

        match load(dir.path()).unwrap_err() {
            ContinuumError::ConfigIncomplete { key, .. } => assert_eq!(key, FILE_PATTERNS_KEY),
            other => panic!("expected ConfigIncomplete, got {other:?}"),
        }
    }

    #[test]
    fn test_legacy_key_and_extra_entries() {
        let dir = tempdir().unwrap();
        fs::create_dir(meta_dir(dir.path())).unwrap();
        fs::write(
            descriptor_path(dir.path()),
            "# written by an old plugin\n[project]\nfile_patterns = *.so\nowner = re-team\n",
        )
        .unwrap();

        let config = load(dir.path()).unwrap();
        assert_eq!(config.file_patterns(), "*.so");
        assert_eq!(config.get("owner"), Some("re-team"));
    }

    #[test]
    fn test_create_refuses_existing_project() {
        let dir = tempdir().unwrap();
        create(dir.path(), "*.exe").unwrap();

        let err = create(dir.path(), "*.dll").unwrap_err();
        assert!(matches!(err, ContinuumError::AlreadyAProject { .. }));
        assert_eq!(load(dir.path()).unwrap().file_patterns(), "*.exe");
    }
}
