//! TestProject builder for project lifecycle tests

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

use continuum::project::descriptor;

/// Builder for creating project directory trees
pub struct TestProject {
    dir: TempDir,
    root: PathBuf,
}

impl TestProject {
    /// Create a new empty directory
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let root = dir
            .path()
            .canonicalize()
            .expect("Failed to canonicalize temp dir");
        Self { dir, root }
    }

    /// Canonical path of the directory
    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn join(&self, relative_path: &str) -> PathBuf {
        self.root.join(relative_path)
    }

    /// Add a fake binary
    pub fn add_binary(&self, relative_path: &str) -> PathBuf {
        self.add_file(relative_path, "MZ")
    }

    /// Add a file with the given content
    pub fn add_file(&self, relative_path: &str, content: &str) -> PathBuf {
        let full_path = self.root.join(relative_path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&full_path, content).expect("Failed to write file");
        full_path
    }

    /// Write a project descriptor with the given patterns
    pub fn init(&self, file_patterns: &str) -> &Self {
        descriptor::create(&self.root, file_patterns).expect("Failed to create descriptor");
        self
    }

    /// Create a multi-binary project: an executable, two libraries and noise
    pub fn with_binaries() -> Self {
        let project = Self::new();
        project.add_binary("app.exe");
        project.add_binary("lib/core.dll");
        project.add_binary("lib/net/http.dll");
        project.add_file("README.md", "# sample");
        project.add_file("lib/core.pdb", "pdb");
        project.init("*.exe;*.dll");
        project
    }

    /// Run the continuum CLI in this directory
    pub fn run_cli(&self, args: &[&str]) -> std::io::Result<Output> {
        Command::new(env!("CARGO_BIN_EXE_continuum"))
            .current_dir(&self.root)
            .env("RUST_LOG", "off")
            .args(args)
            .output()
    }

    /// Run CLI and expect success, return stdout
    pub fn run_cli_success(&self, args: &[&str]) -> String {
        let output = self.run_cli(args).expect("Failed to run CLI");
        assert!(
            output.status.success(),
            "CLI command {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    /// Run CLI and expect failure, return (exit code, stderr)
    pub fn run_cli_failure(&self, args: &[&str]) -> (Option<i32>, String) {
        let output = self.run_cli(args).expect("Failed to run CLI");
        assert!(
            !output.status.success(),
            "CLI command {:?} should have failed",
            args
        );
        (
            output.status.code(),
            String::from_utf8_lossy(&output.stderr).to_string(),
        )
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}
