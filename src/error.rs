//! Error types and exit codes for continuum

use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;

/// Main error type for continuum operations
#[derive(Error, Debug)]
pub enum ContinuumError {
    #[error("A project is already opened in this session")]
    AlreadyOpen,

    #[error("Directory is already a continuum project: {path}")]
    AlreadyAProject { path: PathBuf },

    #[error("Project is lacking its config file: {path}")]
    ConfigMissing { path: PathBuf },

    #[error("Project configuration {path} lacks the `{key}` directive")]
    ConfigIncomplete { path: PathBuf, key: String },

    #[error("Auto-analysis of the current binary has not finished yet")]
    AnalysisNotReady,

    #[error("No binary is loaded in this session")]
    NoActiveBinary,

    #[error("Not inside a continuum project: {path}")]
    NotAProject { path: PathBuf },

    #[error("Invalid file pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("Type index error: {message}")]
    Index { message: String },

    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContinuumError {
    /// Convert error to an exit code:
    /// - 0: Success
    /// - 1: IO error
    /// - 2: Project already open / already a project
    /// - 3: Missing or incomplete project configuration
    /// - 4: Session precondition not met (no binary, analysis running)
    /// - 5: Index or transport failure
    /// - 6: Invalid user configuration or pattern
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Io(_) => ExitCode::from(1),
            Self::AlreadyOpen | Self::AlreadyAProject { .. } => ExitCode::from(2),
            Self::ConfigMissing { .. } | Self::ConfigIncomplete { .. } => ExitCode::from(3),
            Self::NotAProject { .. } => ExitCode::from(3),
            Self::AnalysisNotReady | Self::NoActiveBinary => ExitCode::from(4),
            Self::Index { .. } | Self::Transport { .. } => ExitCode::from(5),
            Self::InvalidPattern { .. } | Self::Config { .. } => ExitCode::from(6),
        }
    }
}

impl From<rusqlite::Error> for ContinuumError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Index {
            message: err.to_string(),
        }
    }
}

/// Result type alias for continuum operations
pub type Result<T> = std::result::Result<T, ContinuumError>;
