//! Out-of-line analysis pass
//!
//! When a project is created every member binary gets an analysis database
//! of its own. The launcher spawns one headless analyzer process per binary
//! and returns immediately. A background thread reaps the analyzers as they
//! exit, so dropping the [`AnalysisPass`] leaves no zombies behind.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread::JoinHandle;

use crate::config::{AnalysisConfig, DatabaseFormat};

use super::database_path_for;

/// A spawned analyzer process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisJob {
    pub binary: PathBuf,
    pub log_file: PathBuf,
    pub pid: u32,
}

/// Summary of one analysis pass
#[derive(Debug, Default)]
pub struct AnalysisPass {
    pub jobs: Vec<AnalysisJob>,
    /// Binaries skipped because their database already exists
    pub skipped: Vec<PathBuf>,
    /// Binaries whose analyzer failed to spawn
    pub failed: Vec<PathBuf>,
    reaper: Option<JoinHandle<usize>>,
}

impl AnalysisPass {
    /// Block until every analyzer of the pass has exited. Returns how many
    /// exited successfully.
    pub fn wait(self) -> usize {
        self.reaper
            .map(|reaper| reaper.join().unwrap_or(0))
            .unwrap_or(0)
    }
}

/// Wait for each analyzer in turn, logging how it ended
fn reap(children: Vec<(PathBuf, Child)>) -> usize {
    let mut succeeded = 0;
    for (binary, mut child) in children {
        match child.wait() {
            Ok(status) if status.success() => {
                tracing::info!("[ANALYSIS] Analyzer finished for {}", binary.display());
                succeeded += 1;
            }
            Ok(status) => tracing::warn!(
                "[ANALYSIS] Analyzer for {} exited with {}",
                binary.display(),
                status
            ),
            Err(e) => tracing::error!(
                "[ANALYSIS] Failed to wait for analyzer of {}: {}",
                binary.display(),
                e
            ),
        }
    }
    succeeded
}

/// Spawns the headless analyzer for project members
#[derive(Debug, Clone)]
pub struct AnalysisLauncher {
    config: AnalysisConfig,
    format: DatabaseFormat,
}

impl AnalysisLauncher {
    pub fn new(config: AnalysisConfig, format: DatabaseFormat) -> Self {
        Self { config, format }
    }

    /// Whether an analyzer program is configured
    pub fn is_enabled(&self) -> bool {
        self.config.program.is_some()
    }

    /// Build the analyzer command line for one binary:
    /// `<program> -A -S"<script>" -L<binary>.log <binary>`
    pub fn command_for(&self, program: &Path, binary: &Path) -> Command {
        let mut command = Command::new(program);
        command.arg("-A");
        if let Some(script) = &self.config.script {
            command.arg(format!("-S\"{}\"", script.display()));
        }
        command.arg(format!("-L{}", log_file_for(binary).display()));
        command.arg(binary);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        command
    }

    /// Spawn the analyzer for every binary in `files`.
    pub fn launch<'a, I>(&self, files: I) -> AnalysisPass
    where
        I: IntoIterator<Item = &'a PathBuf>,
    {
        let mut pass = AnalysisPass::default();
        let mut children = Vec::new();
        let Some(program) = self.config.program.as_deref() else {
            tracing::warn!("[ANALYSIS] No analyzer program configured, skipping analysis pass");
            return pass;
        };

        for binary in files {
            if self.config.skip_existing && database_path_for(binary, self.format).exists() {
                tracing::debug!("[ANALYSIS] Database exists, skipping {}", binary.display());
                pass.skipped.push(binary.clone());
                continue;
            }

            match self.command_for(program, binary).spawn() {
                Ok(child) => {
                    tracing::info!(
                        "[ANALYSIS] Started analyzer (pid {}) for {}",
                        child.id(),
                        binary.display()
                    );
                    pass.jobs.push(AnalysisJob {
                        binary: binary.clone(),
                        log_file: log_file_for(binary),
                        pid: child.id(),
                    });
                    children.push((binary.clone(), child));
                }
                Err(e) => {
                    tracing::error!(
                        "[ANALYSIS] Failed to start analyzer for {}: {}",
                        binary.display(),
                        e
                    );
                    pass.failed.push(binary.clone());
                }
            }
        }

        if !children.is_empty() {
            let spawned = std::thread::Builder::new()
                .name("continuum-analysis".to_string())
                .spawn(move || reap(children));
            match spawned {
                Ok(reaper) => pass.reaper = Some(reaper),
                Err(e) => tracing::warn!(
                    "[ANALYSIS] Could not start reaper thread, analyzers are reaped at exit: {}",
                    e
                ),
            }
        }

        pass
    }
}

fn log_file_for(binary: &Path) -> PathBuf {
    let mut name = binary.as_os_str().to_os_string();
    name.push(".log");
    PathBuf::from(name)
}
