//! Transport towards the other sessions of a project
//!
//! [`SyncClient`] is the outbound half the coordinator talks to. [`HubClient`]
//! is the WebSocket implementation: it owns a tokio runtime on a dedicated
//! thread, joins the project's room on the hub and turns hub traffic into
//! [`SessionEvent`]s on the session queue. Lost connections are retried until
//! the client is stopped.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use super::events::{EventSender, SessionEvent, TypeSync};
use crate::config::HubConfig;
use crate::error::{ContinuumError, Result};
use crate::hub::protocol::{ClientMessage, ServerMessage};
use crate::index::TypeSet;

/// Delay between reconnection attempts
const RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Outbound operations of a session.
///
/// Sends are fire-and-forget: implementations log failures and never report
/// them back.
pub trait SyncClient {
    /// Publish `types` as the authoritative set of its source
    fn push_types(&self, types: &TypeSet, purge_non_indexed: bool);

    /// Ask the session owning `database_path` to come to the foreground
    fn request_focus(&self, database_path: &Path);
}

/// Cloneable handle that queues messages for a running [`HubClient`]
#[derive(Debug, Clone)]
pub struct HubLink {
    commands: mpsc::UnboundedSender<ClientMessage>,
}

impl HubLink {
    fn send(&self, msg: ClientMessage) {
        if self.commands.send(msg).is_err() {
            tracing::debug!("[CLIENT] Transport stopped, dropping outbound message");
        }
    }
}

impl SyncClient for HubLink {
    fn push_types(&self, types: &TypeSet, purge_non_indexed: bool) {
        self.send(ClientMessage::PushTypes {
            types: types.clone(),
            purge_non_indexed,
        });
    }

    fn request_focus(&self, database_path: &Path) {
        self.send(ClientMessage::RequestFocus {
            database_path: database_path.to_path_buf(),
        });
    }
}

/// WebSocket connection to the sync hub
#[derive(Debug)]
pub struct HubClient {
    url: String,
    link: HubLink,
    shutdown: Option<oneshot::Sender<()>>,
    running: Arc<AtomicBool>,
}

impl HubClient {
    /// Start the transport thread and begin connecting to the hub.
    ///
    /// Returns once the thread is spawned; connection progress is reported
    /// through `events`.
    pub fn start(
        hub: &HubConfig,
        project_root: &Path,
        database_path: &Path,
        events: EventSender,
    ) -> Result<Self> {
        let url = hub.url();
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let running = Arc::new(AtomicBool::new(true));

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ContinuumError::Transport {
                message: format!("failed to build runtime: {}", e),
            })?;

        let worker = Worker {
            url: url.clone(),
            join: ClientMessage::Join {
                project_root: project_root.to_path_buf(),
                database_path: database_path.to_path_buf(),
            },
            events,
            commands: commands_rx,
        };
        let thread_running = Arc::clone(&running);
        std::thread::Builder::new()
            .name("continuum-client".to_string())
            .spawn(move || {
                runtime.block_on(worker.run(shutdown_rx));
                thread_running.store(false, Ordering::SeqCst);
            })?;

        tracing::info!("[CLIENT] Transport started for {}", url);
        Ok(Self {
            url,
            link: HubLink {
                commands: commands_tx,
            },
            shutdown: Some(shutdown_tx),
            running,
        })
    }

    /// Handle for queueing outbound messages
    pub fn link(&self) -> HubLink {
        self.link.clone()
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether the transport thread is still alive
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Signal the transport thread to close the connection and exit.
    ///
    /// Does not wait for the thread or for queued sends. Calling it again is
    /// a no-op.
    pub fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
            tracing::info!("[CLIENT] Transport stopping ({})", self.url);
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.shutdown.is_none()
    }
}

impl Drop for HubClient {
    fn drop(&mut self) {
        self.stop();
    }
}

/// State owned by the transport thread
struct Worker {
    url: String,
    join: ClientMessage,
    events: EventSender,
    commands: mpsc::UnboundedReceiver<ClientMessage>,
}

enum Exit {
    Shutdown,
    Lost(String),
}

impl Worker {
    async fn run(mut self, mut shutdown: oneshot::Receiver<()>) {
        loop {
            let exit = tokio::select! {
                _ = &mut shutdown => Exit::Shutdown,
                exit = self.connect_once() => exit,
            };

            match exit {
                Exit::Shutdown => break,
                Exit::Lost(reason) => {
                    tracing::warn!("[CLIENT] Connection to {} lost: {}", self.url, reason);
                    if self.events.send(SessionEvent::Disconnected(reason)).is_err() {
                        // Session is gone
                        break;
                    }
                }
            }

            // Messages queued while offline are dropped
            while self.commands.try_recv().is_ok() {}

            tokio::select! {
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(RECONNECT_DELAY) => {}
            }
        }
        tracing::info!("[CLIENT] Transport stopped ({})", self.url);
    }

    /// One connection attempt, running until the connection ends
    async fn connect_once(&mut self) -> Exit {
        let (mut ws, _) = match connect_async(self.url.as_str()).await {
            Ok(conn) => conn,
            Err(e) => return Exit::Lost(e.to_string()),
        };
        tracing::debug!("[CLIENT] Connected to {}", self.url);

        match serde_json::to_string(&self.join) {
            Ok(json) => {
                if let Err(e) = ws.send(Message::Text(json)).await {
                    return Exit::Lost(e.to_string());
                }
            }
            Err(e) => return Exit::Lost(e.to_string()),
        }

        loop {
            tokio::select! {
                msg = ws.next() => match msg {
                    Some(Ok(Message::Text(text))) => {
                        if !self.handle_message(&text) {
                            let _ = ws.close(None).await;
                            return Exit::Shutdown;
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        let _ = ws.send(Message::Pong(data)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        return Exit::Lost("closed by hub".to_string());
                    }
                    Some(Err(e)) => return Exit::Lost(e.to_string()),
                    Some(Ok(_)) => {}
                },

                cmd = self.commands.recv() => {
                    let Some(cmd) = cmd else {
                        let _ = ws.close(None).await;
                        return Exit::Shutdown;
                    };
                    match serde_json::to_string(&cmd) {
                        Ok(json) => {
                            if let Err(e) = ws.send(Message::Text(json)).await {
                                tracing::error!("[CLIENT] Send failed: {}", e);
                                return Exit::Lost(e.to_string());
                            }
                        }
                        Err(e) => tracing::error!("[CLIENT] Failed to encode message: {}", e),
                    }
                }
            }
        }
    }

    /// Forward one hub message to the session. Returns false once the
    /// session queue is closed.
    fn handle_message(&self, text: &str) -> bool {
        let msg: ServerMessage = match serde_json::from_str(text) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::warn!("[CLIENT] Ignoring malformed hub message: {}", e);
                return true;
            }
        };

        let event = match msg {
            ServerMessage::Joined(info) => {
                tracing::info!(
                    "[CLIENT] Joined {} as {} ({} peers)",
                    info.project_root.display(),
                    info.client_id,
                    info.peers.len()
                );
                SessionEvent::Connected(info)
            }
            ServerMessage::SyncTypes {
                types,
                purge_non_indexed,
            } => SessionEvent::TypesReceived(TypeSync {
                types,
                purge_non_indexed,
            }),
            ServerMessage::FocusInstance { database_path } => {
                SessionEvent::FocusRequested(database_path)
            }
            ServerMessage::PeerJoined { database_path } => SessionEvent::PeerJoined(database_path),
            ServerMessage::PeerLeft { database_path } => SessionEvent::PeerLeft(database_path),
            ServerMessage::Error { code, message } => {
                tracing::warn!("[CLIENT] Hub error {}: {}", code, message);
                return true;
            }
            ServerMessage::Pong => return true,
        };

        self.events.send(event).is_ok()
    }
}
