//! Cross-session type synchronization
//!
//! - [`coordinator`]: reacts to local changes and inbound sets
//! - [`events`]: the per-session event queue
//! - [`client`]: the outbound transport and its hub implementation

pub mod client;
pub mod coordinator;
pub mod events;

pub use client::{HubClient, HubLink, SyncClient};
pub use coordinator::{SyncCoordinator, SyncOutcome, SyncStats};
pub use events::{event_queue, EventReceiver, EventSender, SessionEvent, TypeSync};
