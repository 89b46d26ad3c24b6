//! Session event queue
//!
//! Everything that happens outside the session thread (hub traffic, host
//! hooks fired from worker threads) is turned into a [`SessionEvent`] and
//! queued. The session drains the queue on its own thread, one event at a
//! time, in arrival order.

use std::path::PathBuf;
use std::sync::mpsc;

use crate::hub::protocol::ConnectionInfo;
use crate::index::TypeSet;

/// Sending half of a session queue. Cheap to clone and `Send`.
pub type EventSender = mpsc::Sender<SessionEvent>;

/// Receiving half of a session queue
pub type EventReceiver = mpsc::Receiver<SessionEvent>;

/// Create an unbounded session queue
pub fn event_queue() -> (EventSender, EventReceiver) {
    mpsc::channel()
}

/// Inbound type set together with its purge policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSync {
    pub types: TypeSet,
    pub purge_non_indexed: bool,
}

/// Work item for the session thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The host reported a change in its local type library
    LocalTypesChanged,
    /// Another session pushed its types
    TypesReceived(TypeSync),
    /// Another session asked the owner of this database to come forward
    FocusRequested(PathBuf),
    /// The transport joined the project's room
    Connected(ConnectionInfo),
    /// The transport lost (or failed to establish) its connection
    Disconnected(String),
    PeerJoined(PathBuf),
    PeerLeft(PathBuf),
}

impl SessionEvent {
    /// Short name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Self::LocalTypesChanged => "local_types_changed",
            Self::TypesReceived(_) => "types_received",
            Self::FocusRequested(_) => "focus_requested",
            Self::Connected(_) => "connected",
            Self::Disconnected(_) => "disconnected",
            Self::PeerJoined(_) => "peer_joined",
            Self::PeerLeft(_) => "peer_left",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_preserves_order_across_threads() {
        let (tx, rx) = event_queue();
        let worker = {
            let tx = tx.clone();
            std::thread::spawn(move || {
                tx.send(SessionEvent::PeerJoined(PathBuf::from("/p/b.dll.i64")))
                    .unwrap();
                tx.send(SessionEvent::LocalTypesChanged).unwrap();
            })
        };
        worker.join().unwrap();
        drop(tx);

        let kinds: Vec<_> = rx.iter().map(|e| e.kind()).collect();
        assert_eq!(kinds, vec!["peer_joined", "local_types_changed"]);
    }
}
