//! Multi-binary project model
//!
//! A project is a directory tree whose member binaries are selected by file
//! name patterns. Its metadata lives in `<root>/.continuum/`:
//!
//! ```text
//! <root>/
//! ├── .continuum/
//! │   ├── project.conf    # descriptor (filePatterns=...)
//! │   └── index.sqlite    # shared type index
//! ├── app.exe
//! ├── app.exe.i64         # analysis database of app.exe
//! └── lib/core.dll
//! ```

pub mod analysis;
pub mod descriptor;
pub mod discovery;

use std::path::{Path, PathBuf};

use crate::config::{ContinuumConfig, DatabaseFormat};
use crate::error::Result;
use crate::index::{SymbolIndex, TypeIndex, INDEX_FILE_NAME};
use crate::paths::canonicalize_path;

pub use analysis::{AnalysisJob, AnalysisLauncher, AnalysisPass};
pub use descriptor::ProjectConfig;
pub use discovery::{find_project_files, FileDiscovery, FilePatterns};

/// Name of the per-project metadata directory
pub const META_DIR_NAME: &str = ".continuum";

/// Name of the descriptor file inside [`META_DIR_NAME`]
pub const CONFIG_FILE_NAME: &str = "project.conf";

/// Analysis database path of a binary.
///
/// Pure: the extension is appended to the full file name and the filesystem
/// is never consulted, so `a.exe` and `a.dll` map to different databases.
pub fn database_path_for(binary: &Path, format: DatabaseFormat) -> PathBuf {
    let mut name = binary.as_os_str().to_os_string();
    name.push(".");
    name.push(format.extension());
    PathBuf::from(name)
}

/// Walk upward from `start` (inclusive) to the first directory holding a
/// metadata directory.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(META_DIR_NAME).is_dir())
        .map(Path::to_path_buf)
}

/// A member binary as the project browser lists it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberFile {
    pub path: PathBuf,
    /// Path relative to the project root
    pub relative: PathBuf,
    pub database: PathBuf,
}

/// An opened project
pub struct Project {
    root: PathBuf,
    config: ProjectConfig,
    discovery: FileDiscovery,
    member_files: Vec<PathBuf>,
    format: DatabaseFormat,
    index: Box<dyn SymbolIndex>,
}

impl std::fmt::Debug for Project {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Project")
            .field("root", &self.root)
            .field("config", &self.config)
            .field("member_files", &self.member_files.len())
            .field("source", &self.index.source())
            .finish()
    }
}

impl Project {
    /// Open the project at `root` for the session whose analysis database is
    /// `source`.
    pub fn open(root: &Path, source: &str, format: DatabaseFormat) -> Result<Self> {
        let root = canonicalize_path(root);
        let config = descriptor::load(&root)?;
        let discovery = FileDiscovery::new(&root, FilePatterns::parse(config.file_patterns()))?;
        let index = TypeIndex::open(&descriptor::meta_dir(&root).join(INDEX_FILE_NAME), source)?;
        Self::assemble(root, config, discovery, format, Box::new(index))
    }

    /// Open with a caller-supplied index
    pub fn open_with_index(
        root: &Path,
        format: DatabaseFormat,
        index: Box<dyn SymbolIndex>,
    ) -> Result<Self> {
        let root = canonicalize_path(root);
        let config = descriptor::load(&root)?;
        let discovery = FileDiscovery::new(&root, FilePatterns::parse(config.file_patterns()))?;
        Self::assemble(root, config, discovery, format, index)
    }

    fn assemble(
        root: PathBuf,
        config: ProjectConfig,
        discovery: FileDiscovery,
        format: DatabaseFormat,
        index: Box<dyn SymbolIndex>,
    ) -> Result<Self> {
        let member_files: Vec<PathBuf> = discovery.iter().collect();
        tracing::info!(
            "[PROJECT] Opened {} ({} member files)",
            root.display(),
            member_files.len()
        );
        Ok(Self {
            root,
            config,
            discovery,
            member_files,
            format,
            index,
        })
    }

    /// Create a project at `root`, open it and start the analysis pass over
    /// its members.
    pub fn create(
        root: &Path,
        file_patterns: &str,
        source: &str,
        settings: &ContinuumConfig,
    ) -> Result<(Self, AnalysisPass)> {
        let root = canonicalize_path(root);
        // Reject bad globs before anything is written
        FileDiscovery::new(&root, FilePatterns::parse(file_patterns))?;
        descriptor::create(&root, file_patterns)?;

        let format = settings.database.format;
        let project = Self::open(&root, source, format)?;
        let launcher = AnalysisLauncher::new(settings.analysis.clone(), format);
        let pass = launcher.launch(&project.member_files);
        tracing::info!(
            "[PROJECT] Analysis pass started: {} launched, {} skipped, {} failed",
            pass.jobs.len(),
            pass.skipped.len(),
            pass.failed.len()
        );
        Ok((project, pass))
    }

    /// Release the index and forget the project
    pub fn close(self) -> Result<()> {
        let root = self.root;
        self.index.close()?;
        tracing::info!("[PROJECT] Closed {}", root.display());
        Ok(())
    }

    /// Recompute member files from the loaded patterns
    pub fn refresh(&mut self) -> &[PathBuf] {
        self.member_files = self.discovery.iter().collect();
        tracing::debug!(
            "[PROJECT] Refreshed {} ({} member files)",
            self.root.display(),
            self.member_files.len()
        );
        &self.member_files
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn meta_dir(&self) -> PathBuf {
        descriptor::meta_dir(&self.root)
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn member_files(&self) -> &[PathBuf] {
        &self.member_files
    }

    pub fn database_format(&self) -> DatabaseFormat {
        self.format
    }

    pub fn database_path_for(&self, binary: &Path) -> PathBuf {
        database_path_for(binary, self.format)
    }

    /// Member files relative to the root, with their database paths
    pub fn relative_members(&self) -> Vec<MemberFile> {
        self.member_files
            .iter()
            .map(|path| MemberFile {
                relative: path.strip_prefix(&self.root).unwrap_or(path).to_path_buf(),
                database: database_path_for(path, self.format),
                path: path.clone(),
            })
            .collect()
    }

    pub fn index(&self) -> &dyn SymbolIndex {
        self.index.as_ref()
    }

    pub fn index_mut(&mut self) -> &mut dyn SymbolIndex {
        self.index.as_mut()
    }
}
