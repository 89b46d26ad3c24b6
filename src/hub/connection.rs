//! WebSocket connection handler
//!
//! Manages one session's connection: joining its project room, relaying
//! pushes and focus requests, and leaving the room on disconnect.

use std::path::PathBuf;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio_tungstenite::{accept_async, tungstenite::Message, WebSocketStream};

use super::protocol::{ClientMessage, ConnectionInfo, ServerMessage};
use super::registry::{ProjectRegistry, ProjectRoom, RoomEvent};

/// Handle a single WebSocket connection
pub async fn handle_connection(stream: TcpStream, registry: Arc<ProjectRegistry>) {
    let addr = stream.peer_addr().ok();

    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            tracing::error!("[HUB] WebSocket handshake failed: {}", e);
            return;
        }
    };

    let mut conn = ConnectionState::new(ws_stream, registry);
    conn.run().await;

    tracing::info!("[HUB] Connection closed from {:?}", addr);
}

/// The room membership of a joined connection
struct Membership {
    room: Arc<ProjectRoom>,
    database_path: PathBuf,
    events: broadcast::Receiver<RoomEvent>,
}

/// Next event of the joined room; pending forever before a join
async fn next_room_event(
    membership: &mut Option<Membership>,
) -> Result<RoomEvent, broadcast::error::RecvError> {
    match membership {
        Some(m) => m.events.recv().await,
        None => std::future::pending().await,
    }
}

/// State for a single connection
struct ConnectionState {
    ws: WebSocketStream<TcpStream>,
    registry: Arc<ProjectRegistry>,
    client_id: String,
    membership: Option<Membership>,
}

impl ConnectionState {
    fn new(ws: WebSocketStream<TcpStream>, registry: Arc<ProjectRegistry>) -> Self {
        let id = uuid::Uuid::new_v4().simple().to_string();
        Self {
            ws,
            registry,
            client_id: format!("ses_{}", &id[..8]),
            membership: None,
        }
    }

    async fn run(&mut self) {
        loop {
            tokio::select! {
                msg = self.ws.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            if let Err(e) = self.handle_message(&text).await {
                                tracing::error!("[HUB] Error handling message from {}: {}", self.client_id, e);
                                let _ = self.send_error("bad_message", &e.to_string()).await;
                            }
                        }
                        Some(Ok(Message::Close(_))) => {
                            tracing::debug!("[HUB] Session {} requested close", self.client_id);
                            break;
                        }
                        Some(Ok(Message::Ping(data))) => {
                            let _ = self.ws.send(Message::Pong(data)).await;
                        }
                        Some(Err(e)) => {
                            tracing::warn!("[HUB] WebSocket error from {}: {}", self.client_id, e);
                            break;
                        }
                        None => break,
                        _ => {}
                    }
                }

                event = next_room_event(&mut self.membership) => {
                    match event {
                        Ok(event) => {
                            if self.should_deliver(&event) {
                                if let Err(e) = self.send(&event.message).await {
                                    tracing::warn!("[HUB] Failed to relay to {}: {}", self.client_id, e);
                                    break;
                                }
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!("[HUB] Session {} lagged, {} messages dropped", self.client_id, skipped);
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            }
        }

        self.cleanup();
    }

    fn should_deliver(&self, event: &RoomEvent) -> bool {
        if event.from == self.client_id {
            return false;
        }
        match (&event.target, &self.membership) {
            (Some(target), Some(m)) => target == &m.database_path,
            (None, Some(_)) => true,
            (_, None) => false,
        }
    }

    async fn handle_message(&mut self, text: &str) -> anyhow::Result<()> {
        let msg: ClientMessage = serde_json::from_str(text)?;

        match msg {
            ClientMessage::Join {
                project_root,
                database_path,
            } => {
                if self.membership.is_some() {
                    return self.send_error("already_joined", "session already joined a project").await;
                }

                let (room, peers) =
                    self.registry
                        .join(&project_root, &self.client_id, database_path.clone());
                // Subscribe before announcing so nothing addressed to us is missed
                let events = room.subscribe();
                room.broadcast(
                    &self.client_id,
                    ServerMessage::PeerJoined {
                        database_path: database_path.clone(),
                    },
                );
                tracing::info!(
                    "[HUB] {} joined {} as {} ({} peers)",
                    self.client_id,
                    project_root.display(),
                    database_path.display(),
                    peers.len()
                );
                self.membership = Some(Membership {
                    room,
                    database_path,
                    events,
                });

                let info = ConnectionInfo {
                    client_id: self.client_id.clone(),
                    project_root,
                    peers,
                };
                self.send(&ServerMessage::Joined(info)).await?;
            }

            ClientMessage::PushTypes {
                types,
                purge_non_indexed,
            } => {
                let Some(m) = &self.membership else {
                    return self.send_error("not_joined", "join a project before pushing").await;
                };
                tracing::debug!(
                    "[HUB] {} pushed {} types from {}",
                    self.client_id,
                    types.len(),
                    types.source
                );
                m.room.broadcast(
                    &self.client_id,
                    ServerMessage::SyncTypes {
                        types,
                        purge_non_indexed,
                    },
                );
            }

            ClientMessage::RequestFocus { database_path } => {
                let Some(m) = &self.membership else {
                    return self.send_error("not_joined", "join a project before requesting focus").await;
                };
                let delivered = m.room.send_to(
                    &self.client_id,
                    &database_path,
                    ServerMessage::FocusInstance {
                        database_path: database_path.clone(),
                    },
                );
                if !delivered {
                    let message = format!("no session has {} open", database_path.display());
                    return self.send_error("not_found", &message).await;
                }
            }

            ClientMessage::Ping => {
                self.send(&ServerMessage::Pong).await?;
            }
        }

        Ok(())
    }

    async fn send(&mut self, msg: &ServerMessage) -> anyhow::Result<()> {
        let json = serde_json::to_string(msg)?;
        self.ws.send(Message::Text(json)).await?;
        Ok(())
    }

    async fn send_error(&mut self, code: &str, message: &str) -> anyhow::Result<()> {
        self.send(&ServerMessage::Error {
            code: code.to_string(),
            message: message.to_string(),
        })
        .await
    }

    fn cleanup(&mut self) {
        if let Some(m) = self.membership.take() {
            m.room.broadcast(
                &self.client_id,
                ServerMessage::PeerLeft {
                    database_path: m.database_path.clone(),
                },
            );
            self.registry.leave(&m.room, &self.client_id);
        }
    }
}
