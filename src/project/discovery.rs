//! Member file discovery
//!
//! Resolves a semicolon-separated pattern list (e.g. `*.exe;*.dll`) against a
//! project root. Patterns match file *names* only, never directory
//! components, so `*.dll` finds `root/x/y/z.dll`.
//!
//! Discovery is lazy and restartable: [`FileDiscovery::iter`] starts a fresh
//! read-only walk every time it is called. Siblings are visited in file name
//! order so an unchanged tree always yields the same sequence, and a file
//! matched by several patterns is yielded once.

use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use ignore::{Walk, WalkBuilder};

use super::META_DIR_NAME;
use crate::error::{ContinuumError, Result};

/// Ordered, parsed list of file name patterns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePatterns {
    patterns: Vec<String>,
}

impl FilePatterns {
    /// Parse a semicolon-separated pattern list.
    ///
    /// Whitespace around each pattern is trimmed and empty entries are dropped.
    pub fn parse(raw: &str) -> Self {
        let patterns = raw
            .split(';')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
        Self { patterns }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Compile into a matcher. Invalid globs are reported with the offending pattern.
    fn compile(&self) -> Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &self.patterns {
            let glob = GlobBuilder::new(pattern)
                .literal_separator(true)
                .build()
                .map_err(|e| ContinuumError::InvalidPattern {
                    pattern: pattern.clone(),
                    message: e.kind().to_string(),
                })?;
            builder.add(glob);
        }
        builder.build().map_err(|e| ContinuumError::InvalidPattern {
            pattern: self.to_string(),
            message: e.to_string(),
        })
    }
}

impl std::fmt::Display for FilePatterns {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.patterns.join(";"))
    }
}

/// Reusable discovery of member files below a root
#[derive(Debug, Clone)]
pub struct FileDiscovery {
    root: PathBuf,
    patterns: FilePatterns,
    matcher: GlobSet,
}

impl FileDiscovery {
    pub fn new(root: impl Into<PathBuf>, patterns: FilePatterns) -> Result<Self> {
        let matcher = patterns.compile()?;
        Ok(Self {
            root: root.into(),
            patterns,
            matcher,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn patterns(&self) -> &FilePatterns {
        &self.patterns
    }

    /// Whether a file name matches at least one pattern
    pub fn matches_name(&self, name: &str) -> bool {
        self.matcher.is_match(name)
    }

    /// Start a new pass over the tree
    pub fn iter(&self) -> ProjectFiles<'_> {
        let walk = WalkBuilder::new(&self.root)
            .standard_filters(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(|entry| entry.file_name() != META_DIR_NAME)
            .build();

        ProjectFiles {
            discovery: self,
            walk,
        }
    }
}

impl<'a> IntoIterator for &'a FileDiscovery {
    type Item = PathBuf;
    type IntoIter = ProjectFiles<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// One lazy discovery pass
pub struct ProjectFiles<'a> {
    discovery: &'a FileDiscovery,
    walk: Walk,
}

impl Iterator for ProjectFiles<'_> {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        for entry in self.walk.by_ref() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!("[DISCOVERY] Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }

            let Some(name) = entry.file_name().to_str() else {
                continue;
            };
            if self.discovery.matches_name(name) {
                return Some(entry.into_path());
            }
        }
        None
    }
}

/// Locate all binaries below `root` matching `file_patterns`.
pub fn find_project_files(root: &Path, file_patterns: &str) -> Result<Vec<PathBuf>> {
    let discovery = FileDiscovery::new(root, FilePatterns::parse(file_patterns))?;
    Ok(discovery.iter().collect())
}
