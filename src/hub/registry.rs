//! Project room registry
//!
//! Sessions working on the same project root share one [`ProjectRoom`].
//! Every message a session sends to its peers goes through the room's
//! broadcast channel; each connection filters out its own messages and
//! messages addressed to another database.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;

use super::protocol::ServerMessage;

/// Capacity of a room's broadcast channel
const ROOM_CAPACITY: usize = 256;

/// Message fanned out to the sessions of a room
#[derive(Debug, Clone)]
pub struct RoomEvent {
    /// Client id of the sender, never delivered back to it
    pub from: String,
    /// Only the session with this database receives the event
    pub target: Option<PathBuf>,
    pub message: ServerMessage,
}

/// Sessions of a single project
pub struct ProjectRoom {
    pub project_root: PathBuf,
    /// Client id -> database path
    members: RwLock<HashMap<String, PathBuf>>,
    event_tx: broadcast::Sender<RoomEvent>,
}

impl ProjectRoom {
    fn new(project_root: PathBuf) -> Self {
        let (event_tx, _) = broadcast::channel(ROOM_CAPACITY);
        Self {
            project_root,
            members: RwLock::new(HashMap::new()),
            event_tx,
        }
    }

    /// Register a session, returning the databases of the sessions already present
    fn add_member(&self, client_id: &str, database_path: PathBuf) -> Vec<PathBuf> {
        let mut members = self.members.write();
        let mut peers: Vec<PathBuf> = members.values().cloned().collect();
        peers.sort();
        members.insert(client_id.to_string(), database_path);
        peers
    }

    /// Remove a session, returns true if this was the last member
    fn remove_member(&self, client_id: &str) -> bool {
        let mut members = self.members.write();
        members.remove(client_id);
        members.is_empty()
    }

    pub fn member_count(&self) -> usize {
        self.members.read().len()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RoomEvent> {
        self.event_tx.subscribe()
    }

    /// Deliver `message` to every other session of the room
    pub fn broadcast(&self, from: &str, message: ServerMessage) {
        let _ = self.event_tx.send(RoomEvent {
            from: from.to_string(),
            target: None,
            message,
        });
    }

    /// Deliver `message` to the session(s) owning `database_path`.
    ///
    /// Returns false when no such session is in the room.
    pub fn send_to(&self, from: &str, database_path: &Path, message: ServerMessage) -> bool {
        let present = self
            .members
            .read()
            .values()
            .any(|db| db.as_path() == database_path);
        if present {
            let _ = self.event_tx.send(RoomEvent {
                from: from.to_string(),
                target: Some(database_path.to_path_buf()),
                message,
            });
        }
        present
    }
}

/// Global registry of all rooms
pub struct ProjectRegistry {
    rooms: RwLock<HashMap<PathBuf, Arc<ProjectRoom>>>,
}

impl ProjectRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
        }
    }

    /// Add a session to the room of `project_root`, creating the room on
    /// first use. Returns the room and the databases of the sessions already
    /// in it.
    pub fn join(
        &self,
        project_root: &Path,
        client_id: &str,
        database_path: PathBuf,
    ) -> (Arc<ProjectRoom>, Vec<PathBuf>) {
        let mut rooms = self.rooms.write();
        let room = Arc::clone(rooms.entry(project_root.to_path_buf()).or_insert_with(|| {
            tracing::info!("[HUB] Opening room for {}", project_root.display());
            Arc::new(ProjectRoom::new(project_root.to_path_buf()))
        }));
        let peers = room.add_member(client_id, database_path);
        (room, peers)
    }

    /// Remove a session from its room, closing the room if it was the last
    pub fn leave(&self, room: &ProjectRoom, client_id: &str) {
        let mut rooms = self.rooms.write();
        if room.remove_member(client_id) {
            tracing::info!(
                "[HUB] Closing room for {} (no sessions)",
                room.project_root.display()
            );
            rooms.remove(&room.project_root);
        }
    }

    /// Get all active project roots
    pub fn active_projects(&self) -> Vec<PathBuf> {
        self.rooms.read().keys().cloned().collect()
    }

    /// Get stats about the registry
    pub fn stats(&self) -> RegistryStats {
        let rooms = self.rooms.read();
        RegistryStats {
            room_count: rooms.len(),
            total_sessions: rooms.values().map(|r| r.member_count()).sum(),
        }
    }
}

impl Default for ProjectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics about the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryStats {
    pub room_count: usize,
    pub total_sessions: usize,
}
