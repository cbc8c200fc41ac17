use futures::{SinkExt, StreamExt};
use huddle_core::{ClientMessage, Identity, PeerId, RoomId, ServerMessage, SignalBody};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum SignalingError {
    #[error("connection to signaling relay failed: {0}")]
    ConnectionFailed(String),

    #[error("not connected to the signaling relay")]
    NotConnected,

    #[error("failed to send signaling message: {0}")]
    SendFailed(String),
}

/// Room events surfaced to the call controller, one channel per
/// connection. `Disconnected` is always the final event.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomEvent {
    /// Join echo; carries the handle the relay assigned to us.
    Joined { room: RoomId, peer_id: PeerId },
    /// Somebody arrived in our room; we are expected to call them.
    PeerJoined { identity: Identity, peer_id: PeerId },
    PeerLeft { peer_id: PeerId },
    Signal { from: PeerId, body: SignalBody },
    Disconnected,
}

/// Egress half of the room connection. Cheap to clone; joining a room is
/// fire-and-forget, the `Joined` echo arrives as an event.
#[derive(Clone)]
pub struct RoomHandle {
    tx: mpsc::Sender<ClientMessage>,
}

impl RoomHandle {
    pub async fn join(&self, room: RoomId, identity: Identity) -> Result<(), SignalingError> {
        self.send(ClientMessage::Join { room, identity }).await
    }

    pub async fn send_signal(&self, to: PeerId, body: SignalBody) -> Result<(), SignalingError> {
        self.send(ClientMessage::Signal { to, body }).await
    }

    async fn send(&self, msg: ClientMessage) -> Result<(), SignalingError> {
        self.tx
            .send(msg)
            .await
            .map_err(|e| SignalingError::SendFailed(e.to_string()))
    }
}

/// Membership client: one WebSocket to the relay, decoded into
/// [`RoomEvent`]s. Leaving a room has no primitive of its own — dropping
/// the handle and the event receiver tears the connection down.
pub struct RoomClient;

impl RoomClient {
    pub async fn connect(
        url: &str,
    ) -> Result<(RoomHandle, mpsc::Receiver<RoomEvent>), SignalingError> {
        info!(url, "connecting to signaling relay");

        let (ws, _) = connect_async(url)
            .await
            .map_err(|e| SignalingError::ConnectionFailed(e.to_string()))?;
        let (mut write, mut read) = ws.split();

        let (out_tx, mut out_rx) = mpsc::channel::<ClientMessage>(64);
        let (event_tx, event_rx) = mpsc::channel::<RoomEvent>(64);

        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                let json = match serde_json::to_string(&msg) {
                    Ok(json) => json,
                    Err(e) => {
                        warn!("failed to serialize client message: {e}");
                        continue;
                    }
                };
                if write.send(Message::Text(json)).await.is_err() {
                    break;
                }
            }
            // All handles dropped: leave the room by closing the socket.
            let _ = write.send(Message::Close(None)).await;
        });

        tokio::spawn(async move {
            while let Some(msg) = read.next().await {
                match msg {
                    Ok(Message::Text(text)) => {
                        match serde_json::from_str::<ServerMessage>(&text) {
                            Ok(server_msg) => {
                                if event_tx.send(server_msg.into()).await.is_err() {
                                    return;
                                }
                            }
                            Err(e) => warn!("undecodable server message: {e}"),
                        }
                    }
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        warn!("signaling socket error: {e}");
                        break;
                    }
                }
            }
            let _ = event_tx.send(RoomEvent::Disconnected).await;
        });

        Ok((RoomHandle { tx: out_tx }, event_rx))
    }
}

impl From<ServerMessage> for RoomEvent {
    fn from(msg: ServerMessage) -> Self {
        match msg {
            ServerMessage::Joined { room, peer_id } => RoomEvent::Joined { room, peer_id },
            ServerMessage::PeerJoined { identity, peer_id } => {
                RoomEvent::PeerJoined { identity, peer_id }
            }
            ServerMessage::PeerLeft { peer_id } => RoomEvent::PeerLeft { peer_id },
            ServerMessage::Signal { from, body } => RoomEvent::Signal { from, body },
        }
    }
}
