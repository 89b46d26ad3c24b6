//! In-process transports

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use continuum::sync::EventSender;
use continuum::{Session, SessionEvent, SyncClient, TypeSet, TypeSync};

/// Client that records every outbound call
#[derive(Clone, Default)]
pub struct RecordingClient {
    pub pushes: Rc<RefCell<Vec<(TypeSet, bool)>>>,
    pub focus: Rc<RefCell<Vec<PathBuf>>>,
}

impl RecordingClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_count(&self) -> usize {
        self.pushes.borrow().len()
    }

    pub fn last_push(&self) -> Option<(TypeSet, bool)> {
        self.pushes.borrow().last().cloned()
    }
}

impl SyncClient for RecordingClient {
    fn push_types(&self, types: &TypeSet, purge_non_indexed: bool) {
        self.pushes
            .borrow_mut()
            .push((types.clone(), purge_non_indexed));
    }

    fn request_focus(&self, database_path: &Path) {
        self.focus.borrow_mut().push(database_path.to_path_buf());
    }
}

/// Hub stand-in that delivers straight into session queues.
///
/// Pushes reach every other member; focus requests reach the member with
/// the matching database.
#[derive(Default)]
pub struct LoopbackHub {
    members: RefCell<Vec<(PathBuf, EventSender)>>,
}

impl LoopbackHub {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Register `session` and attach a client bound to this hub
    pub fn connect(self: &Rc<Self>, session: &Session) {
        let database = session
            .database_path()
            .expect("session must have a project open");
        self.members
            .borrow_mut()
            .push((database.clone(), session.events()));
        session.attach_client(Box::new(LoopbackClient {
            hub: Rc::clone(self),
            database,
        }));
    }
}

struct LoopbackClient {
    hub: Rc<LoopbackHub>,
    database: PathBuf,
}

impl SyncClient for LoopbackClient {
    fn push_types(&self, types: &TypeSet, purge_non_indexed: bool) {
        for (database, events) in self.hub.members.borrow().iter() {
            if database != &self.database {
                let _ = events.send(SessionEvent::TypesReceived(TypeSync {
                    types: types.clone(),
                    purge_non_indexed,
                }));
            }
        }
    }

    fn request_focus(&self, database_path: &Path) {
        for (database, events) in self.hub.members.borrow().iter() {
            if database == database_path {
                let _ = events.send(SessionEvent::FocusRequested(database.clone()));
            }
        }
    }
}
