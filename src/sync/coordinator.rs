//! Type-sync coordinator
//!
//! Sits between the session's project (and its index) and the transport.
//! Local changes are indexed and pushed; received sets are merged into the
//! index and the host's type library. While a merge runs, local change
//! notifications are suppressed, including ones the host fires
//! synchronously from inside `import_types`.
//!
//! The coordinator is single-threaded: its state lives in `Cell`/`RefCell`,
//! so it can be re-entered from a host callback but never shared across
//! threads.

use std::cell::{Cell, RefCell};
use std::path::Path;

use super::client::SyncClient;
use super::events::TypeSync;
use crate::error::Result;
use crate::host::HostEnvironment;
use crate::index::MergeStats;
use crate::project::Project;

/// What happened to a local change notification or focus request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Indexed and handed to the client
    Pushed { types: usize },
    /// Focus request handed to the client
    FocusRequested,
    /// Raised while an inbound sync was being applied
    Suppressed,
    /// No client attached
    Detached,
    /// No project open
    NoProject,
    /// Indexing failed; logged, not retried
    Failed,
}

/// Counters for logging and tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub pushes: u64,
    pub merges: u64,
    pub suppressed: u64,
    pub failures: u64,
}

/// Drives index and client from session events
#[derive(Default)]
pub struct SyncCoordinator {
    client: RefCell<Option<Box<dyn SyncClient>>>,
    ignore_changes: Cell<bool>,
    stats: Cell<SyncStats>,
}

impl std::fmt::Debug for SyncCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncCoordinator")
            .field("attached", &self.is_attached())
            .field("ignore_changes", &self.ignore_changes.get())
            .field("stats", &self.stats.get())
            .finish()
    }
}

/// Holds `ignore_changes` set for its lifetime
struct Suppression<'a> {
    flag: &'a Cell<bool>,
    previous: bool,
}

impl<'a> Suppression<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        let previous = flag.replace(true);
        Self { flag, previous }
    }
}

impl Drop for Suppression<'_> {
    fn drop(&mut self) {
        self.flag.set(self.previous);
    }
}

impl SyncCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach_client(&self, client: Box<dyn SyncClient>) {
        let replaced = self.client.replace(Some(client)).is_some();
        tracing::info!(
            "[SYNC] Client attached{}",
            if replaced { " (replacing previous)" } else { "" }
        );
    }

    pub fn detach_client(&self) -> bool {
        let detached = self.client.borrow_mut().take().is_some();
        if detached {
            tracing::info!("[SYNC] Client detached");
        }
        detached
    }

    pub fn is_attached(&self) -> bool {
        self.client.borrow().is_some()
    }

    /// Whether an inbound sync is being applied right now
    pub fn is_suppressing(&self) -> bool {
        self.ignore_changes.get()
    }

    pub fn stats(&self) -> SyncStats {
        self.stats.get()
    }

    fn bump(&self, f: impl FnOnce(&mut SyncStats)) {
        let mut stats = self.stats.get();
        f(&mut stats);
        self.stats.set(stats);
    }

    /// Decide a local change notification without touching the project.
    ///
    /// Returns `Some` when the notification must be dropped. Safe to call
    /// while the project is borrowed by an inbound merge.
    pub fn screen_local_change(&self) -> Option<SyncOutcome> {
        if self.ignore_changes.get() {
            self.bump(|s| s.suppressed += 1);
            tracing::debug!("[SYNC] Local change suppressed during inbound sync");
            return Some(SyncOutcome::Suppressed);
        }
        if !self.is_attached() {
            tracing::debug!("[SYNC] Local change ignored, no client attached");
            return Some(SyncOutcome::Detached);
        }
        None
    }

    /// Index this session's types and push them as the authoritative set of
    /// its source.
    pub fn on_local_type_change(
        &self,
        project: &mut Project,
        host: &dyn HostEnvironment,
    ) -> Result<SyncOutcome> {
        if let Some(outcome) = self.screen_local_change() {
            return Ok(outcome);
        }

        let set = match project.index_mut().index_local_types(host, true) {
            Ok(set) => set,
            Err(e) => {
                self.bump(|s| s.failures += 1);
                return Err(e);
            }
        };

        let client = self.client.borrow();
        let Some(client) = client.as_ref() else {
            return Ok(SyncOutcome::Detached);
        };
        client.push_types(&set, true);
        self.bump(|s| s.pushes += 1);
        tracing::info!("[SYNC] Pushed {} types from {}", set.len(), set.source);
        Ok(SyncOutcome::Pushed { types: set.len() })
    }

    /// Merge a set received from another session.
    ///
    /// Local change notifications raised while this runs are suppressed;
    /// the suppression ends on every exit path.
    pub fn on_types_received(
        &self,
        project: &mut Project,
        host: &dyn HostEnvironment,
        sync: &TypeSync,
    ) -> Result<MergeStats> {
        let _guard = Suppression::enter(&self.ignore_changes);

        let result = project.index_mut().sync_types_into_database(
            host,
            &sync.types,
            sync.purge_non_indexed,
        );
        match &result {
            Ok(stats) => {
                self.bump(|s| s.merges += 1);
                tracing::info!(
                    "[SYNC] Merged {} types from {} ({} imported, {} purged)",
                    sync.types.len(),
                    sync.types.source,
                    stats.imported,
                    stats.removed
                );
            }
            Err(_) => self.bump(|s| s.failures += 1),
        }
        result
    }

    /// Ask the session analysing `member` to come to the foreground
    pub fn on_focus_instance(&self, project: &Project, member: &Path) -> SyncOutcome {
        let client = self.client.borrow();
        let Some(client) = client.as_ref() else {
            tracing::debug!("[SYNC] Focus request ignored, no client attached");
            return SyncOutcome::Detached;
        };
        let database = project.database_path_for(member);
        tracing::debug!("[SYNC] Requesting focus of {}", database.display());
        client.request_focus(&database);
        SyncOutcome::FocusRequested
    }
}
