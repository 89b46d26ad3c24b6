//! Per-session controller
//!
//! One [`Session`] exists per running host instance. It owns the open
//! project, the sync coordinator and the hub transport, and is the only
//! object host glue talks to:
//!
//! - host hooks: [`Session::on_session_ready`], [`Session::on_local_type_change`]
//! - user actions: create/open/close/refresh the project, focus a member
//! - the event loop: [`Session::pump_events`], called from the host's idle
//!   or timer callback on the session thread
//!
//! Hub traffic arrives on a queue owned by the running transport, so nothing
//! a stopped transport still had in flight reaches the next project.
//!
//! All methods take `&self`. The host may call back into the session from
//! inside [`HostEnvironment::import_types`]; those calls are answered without
//! touching the project, which the running merge holds.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::config::ContinuumConfig;
use crate::error::{ContinuumError, Result};
use crate::host::HostEnvironment;
use crate::paths::canonicalize_parent;
use crate::project::{self, AnalysisPass, MemberFile, Project};
use crate::sync::{
    event_queue, EventReceiver, EventSender, HubClient, SessionEvent, SyncClient,
    SyncCoordinator, SyncOutcome, SyncStats, TypeSync,
};

/// A running hub client and the queue it reports into
struct Transport {
    client: HubClient,
    events: EventReceiver,
}

/// Controller for one analysis session
pub struct Session {
    host: Rc<dyn HostEnvironment>,
    settings: ContinuumConfig,
    project: RefCell<Option<Project>>,
    /// Analysis database of this session while a project is open
    database_path: RefCell<Option<PathBuf>>,
    coordinator: SyncCoordinator,
    transport: RefCell<Option<Transport>>,
    events_tx: EventSender,
    events_rx: EventReceiver,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("project", &self.project_root())
            .field("database_path", &self.database_path.borrow())
            .field("coordinator", &self.coordinator)
            .field("transport", &self.transport.borrow().is_some())
            .finish()
    }
}

impl Session {
    pub fn new(host: Rc<dyn HostEnvironment>, settings: ContinuumConfig) -> Self {
        let (events_tx, events_rx) = event_queue();
        Self {
            host,
            settings,
            project: RefCell::new(None),
            database_path: RefCell::new(None),
            coordinator: SyncCoordinator::new(),
            transport: RefCell::new(None),
            events_tx,
            events_rx,
        }
    }

    /// Sender for this session's queue, usable from any thread.
    ///
    /// Events queued here outlive project changes; hub traffic uses a queue
    /// of its own.
    pub fn events(&self) -> EventSender {
        self.events_tx.clone()
    }

    pub fn settings(&self) -> &ContinuumConfig {
        &self.settings
    }

    pub fn is_project_open(&self) -> bool {
        self.project
            .try_borrow()
            .map(|p| p.is_some())
            .unwrap_or(true)
    }

    pub fn project_root(&self) -> Option<PathBuf> {
        self.project
            .try_borrow()
            .ok()
            .and_then(|p| p.as_ref().map(|p| p.root().to_path_buf()))
    }

    /// Analysis database of this session, while a project is open
    pub fn database_path(&self) -> Option<PathBuf> {
        self.database_path.borrow().clone()
    }

    pub fn is_attached(&self) -> bool {
        self.coordinator.is_attached()
    }

    pub fn is_transport_running(&self) -> bool {
        self.transport.borrow().is_some()
    }

    pub fn sync_stats(&self) -> SyncStats {
        self.coordinator.stats()
    }

    /// Host finished loading: reopen the project the binary belongs to.
    ///
    /// Returns the opened root, if any.
    pub fn on_session_ready(&self) -> Result<Option<PathBuf>> {
        if self.is_project_open() {
            return Ok(None);
        }
        let Some(binary) = self.host.current_binary_path() else {
            return Ok(None);
        };
        let Some(root) = binary.parent().and_then(project::find_project_root) else {
            tracing::debug!("[SESSION] {} is not part of a project", binary.display());
            return Ok(None);
        };
        self.open_project(&root)?;
        Ok(Some(root))
    }

    fn session_database(&self) -> Result<PathBuf> {
        let binary = self
            .host
            .current_binary_path()
            .ok_or(ContinuumError::NoActiveBinary)?;
        // Members are listed under the canonical root; the database must be too
        Ok(project::database_path_for(
            &canonicalize_parent(&binary),
            self.settings.database.format,
        ))
    }

    /// Create a project at `root`, open it and start its analysis pass
    pub fn create_project(&self, root: &Path, file_patterns: &str) -> Result<AnalysisPass> {
        if self.is_project_open() {
            return Err(ContinuumError::AlreadyOpen);
        }
        let database = self.session_database()?;
        if !self.host.auto_analysis_complete() {
            return Err(ContinuumError::AnalysisNotReady);
        }

        let (project, pass) = Project::create(
            root,
            file_patterns,
            &source_tag(&database),
            &self.settings,
        )?;
        self.install(project, database);
        Ok(pass)
    }

    /// Open the existing project at `root`
    pub fn open_project(&self, root: &Path) -> Result<()> {
        if self.is_project_open() {
            return Err(ContinuumError::AlreadyOpen);
        }
        let database = self.session_database()?;
        let project = Project::open(root, &source_tag(&database), self.settings.database.format)?;
        self.install(project, database);
        Ok(())
    }

    fn install(&self, project: Project, database: PathBuf) {
        let root = project.root().to_path_buf();
        *self.project.borrow_mut() = Some(project);
        *self.database_path.borrow_mut() = Some(database.clone());
        tracing::info!(
            "[SESSION] Project {} open as {}",
            root.display(),
            database.display()
        );

        if self.settings.hub.connect_on_open {
            self.start_transport(&root, &database);
        }
    }

    fn start_transport(&self, root: &Path, database: &Path) {
        let (events_tx, events) = event_queue();
        match HubClient::start(&self.settings.hub, root, database, events_tx) {
            Ok(client) => *self.transport.borrow_mut() = Some(Transport { client, events }),
            Err(e) => tracing::warn!("[SESSION] Sync transport unavailable: {}", e),
        }
    }

    /// Close the open project. Returns false when none was open.
    pub fn close_project(&self) -> Result<bool> {
        self.coordinator.detach_client();
        // Dropping the transport's queue discards whatever it still sends
        if let Some(mut transport) = self.transport.borrow_mut().take() {
            transport.client.stop();
        }
        while self.events_rx.try_recv().is_ok() {}

        self.database_path.borrow_mut().take();
        let Some(project) = self.project.borrow_mut().take() else {
            return Ok(false);
        };
        project.close()?;
        Ok(true)
    }

    /// Rescan member files. `None` when no project is open.
    pub fn refresh_project(&self) -> Option<Vec<PathBuf>> {
        let mut project = self.project.borrow_mut();
        project.as_mut().map(|p| p.refresh().to_vec())
    }

    /// Member files as the project browser lists them
    pub fn member_files(&self) -> Vec<MemberFile> {
        self.project
            .borrow()
            .as_ref()
            .map(Project::relative_members)
            .unwrap_or_default()
    }

    /// Ask the session analysing `member` to come to the foreground
    pub fn focus_instance(&self, member: &Path) -> SyncOutcome {
        match self.project.borrow().as_ref() {
            Some(project) => self.coordinator.on_focus_instance(project, member),
            None => SyncOutcome::NoProject,
        }
    }

    /// Host hook: the local type library changed.
    ///
    /// May be called reentrantly from inside an inbound merge.
    pub fn on_local_type_change(&self) -> SyncOutcome {
        if let Some(outcome) = self.coordinator.screen_local_change() {
            return outcome;
        }
        let Ok(mut project) = self.project.try_borrow_mut() else {
            tracing::warn!("[SESSION] Local change raised while the project is busy");
            return SyncOutcome::Suppressed;
        };
        let Some(project) = project.as_mut() else {
            return SyncOutcome::NoProject;
        };

        match self
            .coordinator
            .on_local_type_change(project, self.host.as_ref())
        {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("[SESSION] Failed to index local types: {}", e);
                SyncOutcome::Failed
            }
        }
    }

    pub fn attach_client(&self, client: Box<dyn SyncClient>) {
        self.coordinator.attach_client(client);
    }

    pub fn detach_client(&self) -> bool {
        self.coordinator.detach_client()
    }

    /// Dispatch every queued event, session queue first, then hub traffic,
    /// each in arrival order. Returns how many were handled.
    pub fn pump_events(&self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.dispatch(event);
            handled += 1;
        }

        let inbound: Vec<SessionEvent> = match self.transport.borrow().as_ref() {
            Some(transport) => transport.events.try_iter().collect(),
            None => Vec::new(),
        };
        for event in inbound {
            // A handler may have closed the project meanwhile
            if self.transport.borrow().is_none() {
                break;
            }
            self.dispatch(event);
            handled += 1;
        }
        handled
    }

    fn dispatch(&self, event: SessionEvent) {
        tracing::trace!("[SESSION] Handling {}", event.kind());
        match event {
            SessionEvent::LocalTypesChanged => {
                self.on_local_type_change();
            }
            SessionEvent::TypesReceived(sync) => self.on_types_received(&sync),
            SessionEvent::FocusRequested(database) => self.on_focus_requested(&database),
            SessionEvent::Connected(info) => {
                let link = self
                    .transport
                    .borrow()
                    .as_ref()
                    .map(|t| t.client.link());
                if let Some(link) = link {
                    self.coordinator.attach_client(Box::new(link));
                }
                tracing::info!(
                    "[SESSION] Connected as {} with {} peers",
                    info.client_id,
                    info.peers.len()
                );
                if self.settings.sync.push_on_connect {
                    self.on_local_type_change();
                }
            }
            SessionEvent::Disconnected(reason) => {
                if self.coordinator.detach_client() {
                    tracing::warn!("[SESSION] Disconnected from hub: {}", reason);
                }
            }
            SessionEvent::PeerJoined(database) => {
                tracing::info!("[SESSION] Peer joined: {}", database.display());
            }
            SessionEvent::PeerLeft(database) => {
                tracing::info!("[SESSION] Peer left: {}", database.display());
            }
        }
    }

    fn on_types_received(&self, sync: &TypeSync) {
        let mut project = self.project.borrow_mut();
        let Some(project) = project.as_mut() else {
            tracing::debug!("[SESSION] Dropping type set, no project open");
            return;
        };
        if let Err(e) = self
            .coordinator
            .on_types_received(project, self.host.as_ref(), sync)
        {
            tracing::error!(
                "[SESSION] Failed to merge types from {}: {}",
                sync.types.source,
                e
            );
        }
    }

    fn on_focus_requested(&self, database: &Path) {
        if self.database_path.borrow().as_deref() == Some(database) {
            tracing::info!("[SESSION] Focus requested");
            self.host.bring_to_front();
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Err(e) = self.close_project() {
            tracing::error!("[SESSION] Failed to close project: {}", e);
        }
    }
}

/// Index source tag of a database path
fn source_tag(database: &Path) -> String {
    database.display().to_string()
}
