//! Command modules for the continuum CLI
//!
//! Each command module implements a single top-level command:
//! - `init` - Create a project descriptor (and optionally start analysis)
//! - `files` - List member files of the enclosing project
//! - `root` - Locate the enclosing project root
//! - `db_path` - Map a binary to its analysis database
//! - `hub` - Run the sync hub
//!
//! All command handlers take their respective `Args` struct from `cli.rs`
//! and a shared `CommandContext`, and return the text to print.

pub mod db_path;
pub mod files;
pub mod hub;
pub mod init;
pub mod root;

pub use db_path::run_db_path;
pub use files::run_files;
pub use hub::run_hub;
pub use init::run_init;
pub use root::run_root;

use std::path::{Path, PathBuf};

use crate::cli::OutputFormat;
use crate::config::ContinuumConfig;
use crate::error::{ContinuumError, Result};
use crate::paths::{canonicalize_path, resolve_pathbuf};
use crate::project::find_project_root;

/// Shared context passed to all command handlers
#[derive(Debug, Clone, Default)]
pub struct CommandContext {
    /// Output format (text or json)
    pub format: OutputFormat,
    /// Show verbose output
    pub verbose: bool,
    /// User configuration
    pub config: ContinuumConfig,
}

impl CommandContext {
    /// Create a new CommandContext from CLI args
    pub fn from_cli(format: OutputFormat, verbose: bool, config: ContinuumConfig) -> Self {
        Self {
            format,
            verbose,
            config,
        }
    }

    /// Render `value` as pretty JSON
    fn json(&self, value: &serde_json::Value) -> Result<String> {
        serde_json::to_string_pretty(value)
            .map(|s| s + "\n")
            .map_err(|e| ContinuumError::Config {
                message: format!("JSON serialization failed: {}", e),
            })
    }
}

/// Resolve an optional CLI path and find the project enclosing it
fn enclosing_root(path: Option<&PathBuf>) -> Result<PathBuf> {
    let start = canonicalize_path(&resolve_pathbuf(path)?);
    find_project_root(&start).ok_or(ContinuumError::NotAProject { path: start })
}

fn display(path: &Path) -> String {
    path.display().to_string()
}
