//! continuum: multi-binary projects for binary analysis sessions
//!
//! Several analysis sessions, each working on one binary of a larger
//! program, share a project: a directory whose member binaries are selected
//! by file name patterns. Sessions of the same project keep their local type
//! definitions in sync through a small relay hub.
//!
//! # Example
//!
//! ```ignore
//! use std::rc::Rc;
//! use continuum::{ContinuumConfig, Session};
//!
//! let session = Session::new(Rc::new(MyHost::new()), ContinuumConfig::load()?);
//! session.on_session_ready()?;
//!
//! // From the host's local-types-changed hook:
//! session.on_local_type_change();
//!
//! // From the host's idle callback:
//! session.pump_events();
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod fs_utils;
pub mod host;
pub mod hub;
pub mod index;
pub mod paths;
pub mod project;
pub mod session;
pub mod sync;

// Re-export commonly used types
pub use config::{ContinuumConfig, DatabaseFormat};
pub use error::{ContinuumError, Result};
pub use host::HostEnvironment;
pub use index::{MergeStats, SymbolIndex, TypeDefinition, TypeIndex, TypeSet};
pub use project::{
    database_path_for, find_project_files, find_project_root, FileDiscovery, FilePatterns,
    MemberFile, Project, ProjectConfig,
};
pub use session::Session;
pub use sync::{
    HubClient, SessionEvent, SyncClient, SyncCoordinator, SyncOutcome, SyncStats, TypeSync,
};

/// Initialise stderr logging for the binaries.
///
/// `RUST_LOG` takes precedence; `level` is the default for this crate.
pub fn init_tracing(level: &str) {
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    match format!("continuum={}", level).parse() {
        Ok(directive) => filter = filter.add_directive(directive),
        Err(e) => eprintln!("Ignoring invalid log level `{}`: {}", level, e),
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
