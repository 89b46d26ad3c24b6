//! Interface to the host analysis environment
//!
//! The host owns the loaded binary, its analysis database and the local type
//! library. Continuum never talks to it directly beyond this trait. Hooks
//! fired by the host (local types changed, session ready) are forwarded to
//! [`crate::session::Session`].

use std::path::PathBuf;

use crate::error::Result;
use crate::index::TypeDefinition;

/// What the coordinator needs from the running analysis environment.
///
/// All methods are called on the session thread.
pub trait HostEnvironment {
    /// Path of the binary loaded in this session, if any
    fn current_binary_path(&self) -> Option<PathBuf>;

    /// Whether the host finished its own auto-analysis of the current binary
    fn auto_analysis_complete(&self) -> bool;

    /// Snapshot of the local type library
    fn local_types(&self) -> Vec<TypeDefinition>;

    /// Declare `types` in the local type library, replacing same-named types.
    ///
    /// Hosts commonly fire their local-types-changed hook from inside this
    /// call; the coordinator suppresses the resulting echo.
    fn import_types(&self, types: &[TypeDefinition]) -> Result<()>;

    /// Bring this session's window to the foreground
    fn bring_to_front(&self) {}
}
