//! The live channel task and its handle.
//!
//! Exactly one connection exists per credential: the [`LiveChannel`] handle
//! is owned by whoever opened it (the session guard), and opening a new one
//! means shutting this one down first. Authentication happens once at
//! connect time, never per message.
//!
//! The task reconnects after a fixed delay when the socket drops and
//! publishes [`ChannelNotification::Up`] on every (re)connect. Consumers
//! treat `Up` as "push delivery may have gapped — refetch your state".

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::connect_async;
use tracing::{debug, info, warn};

use agora_shared::events::{ClientEvent, ServerEvent};

use crate::error::ChannelError;

const COMMAND_BUFFER: usize = 64;
const NOTIFICATION_BUFFER: usize = 256;

/// How and where to connect.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// WebSocket endpoint, e.g. `ws://localhost:5000/live`.
    pub ws_url: String,
    /// Bearer token presented in the auth frame at connect time.
    pub token: String,
    /// Username announced with `user_connected` after authenticating.
    pub username: String,
    /// Pause between reconnect attempts.
    pub reconnect_delay: Duration,
}

impl ChannelConfig {
    pub fn new(ws_url: impl Into<String>, token: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
            token: token.into(),
            username: username.into(),
            reconnect_delay: Duration::from_secs(2),
        }
    }
}

/// Commands sent *into* the channel task.
#[derive(Debug)]
enum ChannelCommand {
    Emit(ClientEvent),
    Shutdown,
}

/// Notifications sent *from* the channel task to subscribers.
#[derive(Debug, Clone)]
pub enum ChannelNotification {
    /// Connected (or reconnected). Active views should refetch.
    Up,
    /// The connection dropped; the task will retry.
    Down { reason: String },
    /// A decoded push event.
    Event(ServerEvent),
}

/// Handle to the running channel task.
///
/// Dropping the handle does not stop the task; call [`LiveChannel::shutdown`]
/// for an orderly close (the session guard does this on every teardown).
pub struct LiveChannel {
    cmd_tx: mpsc::Sender<ChannelCommand>,
    notif_tx: broadcast::Sender<ChannelNotification>,
    task: JoinHandle<()>,
}

impl LiveChannel {
    /// Queue a client event for the server.
    pub async fn emit(&self, event: ClientEvent) -> Result<(), ChannelError> {
        self.cmd_tx
            .send(ChannelCommand::Emit(event))
            .await
            .map_err(|_| ChannelError::Closed)
    }

    /// A new stream of notifications. Every subscriber sees every
    /// notification from the point of subscription on.
    pub fn subscribe(&self) -> broadcast::Receiver<ChannelNotification> {
        self.notif_tx.subscribe()
    }

    /// Close the connection and stop the task.
    pub async fn shutdown(self) {
        let _ = self.cmd_tx.send(ChannelCommand::Shutdown).await;
        if self.task.await.is_err() {
            warn!("Live channel task panicked during shutdown");
        }
    }
}

/// Spawn the channel task. The connection is established asynchronously;
/// subscribers learn about it through [`ChannelNotification::Up`].
pub fn spawn_channel(config: ChannelConfig) -> LiveChannel {
    let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_BUFFER);
    let (notif_tx, _) = broadcast::channel(NOTIFICATION_BUFFER);

    let task = tokio::spawn(run_channel(config, cmd_rx, notif_tx.clone()));

    LiveChannel {
        cmd_tx,
        notif_tx,
        task,
    }
}

async fn run_channel(
    config: ChannelConfig,
    mut cmd_rx: mpsc::Receiver<ChannelCommand>,
    notif_tx: broadcast::Sender<ChannelNotification>,
) {
    loop {
        // The connect attempt itself can stall (a peer that accepts TCP but
        // never answers the handshake), so it races the command channel:
        // teardown never waits on a pending connect.
        let attempt = tokio::select! {
            attempt = connect_async(&config.ws_url) => attempt,
            cmd = cmd_rx.recv() => {
                if matches!(cmd, Some(ChannelCommand::Shutdown) | None) {
                    info!("Live channel shut down while connecting");
                    return;
                }
                // Emits while disconnected are dropped; retry the connect.
                continue;
            }
        };

        match attempt {
            Ok((socket, _)) => {
                info!(url = %config.ws_url, "Live channel connected");
                let _ = notif_tx.send(ChannelNotification::Up);

                let outcome = drive_connection(socket, &config, &mut cmd_rx, &notif_tx).await;
                match outcome {
                    Disconnect::Requested => {
                        info!("Live channel shut down");
                        return;
                    }
                    Disconnect::Lost(reason) => {
                        warn!(reason = %reason, "Live channel connection lost");
                        let _ = notif_tx.send(ChannelNotification::Down { reason });
                    }
                }
            }
            Err(e) => {
                warn!(url = %config.ws_url, error = %e, "Live channel connect failed");
                let _ = notif_tx.send(ChannelNotification::Down {
                    reason: e.to_string(),
                });
            }
        }

        // Wait before retrying, but stay responsive to shutdown.
        tokio::select! {
            _ = tokio::time::sleep(config.reconnect_delay) => {}
            cmd = cmd_rx.recv() => {
                if matches!(cmd, Some(ChannelCommand::Shutdown) | None) {
                    info!("Live channel shut down while disconnected");
                    return;
                }
                // Emits while disconnected are dropped; there is no queueing.
            }
        }
    }
}

enum Disconnect {
    /// Shutdown command, or all handles dropped.
    Requested,
    Lost(String),
}

async fn drive_connection<S>(
    socket: tokio_tungstenite::WebSocketStream<S>,
    config: &ChannelConfig,
    cmd_rx: &mut mpsc::Receiver<ChannelCommand>,
    notif_tx: &broadcast::Sender<ChannelNotification>,
) -> Disconnect
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    let (mut sink, mut stream) = socket.split();

    // Authenticate, then announce presence.
    let auth = serde_json::json!({ "auth": { "token": config.token } }).to_string();
    if let Err(e) = sink.send(Message::Text(auth.into())).await {
        return Disconnect::Lost(format!("auth frame failed: {e}"));
    }
    let hello = ClientEvent::UserConnected {
        username: config.username.clone(),
    };
    if let Err(e) = sink.send(Message::Text(hello.to_frame().into())).await {
        return Disconnect::Lost(format!("presence frame failed: {e}"));
    }

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(ChannelCommand::Emit(event)) => {
                        debug!(event = event.wire_name(), "Emitting client event");
                        if let Err(e) = sink.send(Message::Text(event.to_frame().into())).await {
                            return Disconnect::Lost(format!("send failed: {e}"));
                        }
                    }
                    Some(ChannelCommand::Shutdown) | None => {
                        let _ = sink.send(Message::Close(None)).await;
                        return Disconnect::Requested;
                    }
                }
            }

            frame = stream.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        match ServerEvent::from_frame(&text) {
                            Ok(event) => {
                                let _ = notif_tx.send(ChannelNotification::Event(event));
                            }
                            // Unknown or malformed events are dropped, never fatal.
                            Err(e) => debug!(error = %e, "Ignoring undecodable frame"),
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if let Err(e) = sink.send(Message::Pong(data)).await {
                            return Disconnect::Lost(format!("pong failed: {e}"));
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        return Disconnect::Lost("closed by server".into());
                    }
                    Some(Ok(_)) => {
                        // Binary and pong frames are not part of the contract.
                    }
                    Some(Err(e)) => {
                        return Disconnect::Lost(e.to_string());
                    }
                }
            }
        }
    }
}
