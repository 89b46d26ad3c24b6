//! Hub protocol message types
//!
//! Defines the JSON message format spoken between sessions and the hub.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::index::TypeSet;

/// Session-to-hub message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Join the room of a project
    Join {
        project_root: PathBuf,
        database_path: PathBuf,
    },
    /// Authoritative type set of the sender
    PushTypes {
        types: TypeSet,
        #[serde(default)]
        purge_non_indexed: bool,
    },
    /// Ask the session owning `database_path` to come to the foreground
    RequestFocus { database_path: PathBuf },
    /// Ping to check connection
    Ping,
}

/// Hub-to-session message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Room joined
    Joined(ConnectionInfo),
    /// Type set pushed by another session of the project
    SyncTypes {
        types: TypeSet,
        #[serde(default)]
        purge_non_indexed: bool,
    },
    /// Focus request addressed to this session
    FocusInstance { database_path: PathBuf },
    PeerJoined { database_path: PathBuf },
    PeerLeft { database_path: PathBuf },
    /// Error response
    Error { code: String, message: String },
    /// Pong response
    Pong,
}

/// Connection info returned after a successful join
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionInfo {
    pub client_id: String,
    pub project_root: PathBuf,
    /// Database paths of the other sessions in the room
    #[serde(default)]
    pub peers: Vec<PathBuf>,
}
