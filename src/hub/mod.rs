//! Continuum sync hub
//!
//! A small relay daemon connecting the sessions of each project.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                   CONTINUUM HUB (continuum-hub)               │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ProjectRegistry (RwLock)                                     │
//! │    /work/malware ──► ProjectRoom { members, event_tx }        │
//! │    /work/firmware ─► ProjectRoom { ... }                      │
//! │                                                               │
//! │  WebSocket server ──► ConnectionState per session             │
//! │    - joins one room                                           │
//! │    - relays pushes to the other members                       │
//! │    - routes focus requests by database path                   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Protocol
//!
//! All messages are JSON over WebSocket:
//!
//! ```json
//! // Session -> Hub
//! {"type": "join", "project_root": "/work/malware", "database_path": "/work/malware/a.exe.i64"}
//! {"type": "push_types", "types": {"source": "...", "types": {"T1": "typedef int T1;"}}, "purge_non_indexed": true}
//! {"type": "request_focus", "database_path": "/work/malware/lib/b.dll.i64"}
//!
//! // Hub -> Session
//! {"type": "joined", "client_id": "ses_1a2b3c4d", "project_root": "/work/malware", "peers": [...]}
//! {"type": "sync_types", "types": {...}, "purge_non_indexed": true}
//! {"type": "focus_instance", "database_path": "/work/malware/lib/b.dll.i64"}
//! ```

pub mod connection;
pub mod protocol;
pub mod registry;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

pub use connection::handle_connection;
pub use protocol::{ClientMessage, ConnectionInfo, ServerMessage};
pub use registry::{ProjectRegistry, ProjectRoom, RegistryStats};

/// Accept connections on `listener` until the task is dropped
pub async fn serve(listener: TcpListener, registry: Arc<ProjectRegistry>) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                tracing::debug!("[HUB] Accepted connection from {}", addr);
                let registry = Arc::clone(&registry);
                tokio::spawn(async move {
                    handle_connection(stream, registry).await;
                });
            }
            Err(e) => {
                tracing::error!("[HUB] Failed to accept connection: {}", e);
            }
        }
    }
}

/// Bind `host:port` and serve forever
pub async fn run(host: &str, port: u16) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("[HUB] Listening on ws://{}", listener.local_addr()?);

    serve(listener, Arc::new(ProjectRegistry::new())).await;
    Ok(())
}
