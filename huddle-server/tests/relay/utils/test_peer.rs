use anyhow::{Context, Result, bail};
use futures::{SinkExt, StreamExt};
use huddle_core::{ClientMessage, Identity, PeerId, RoomId, ServerMessage, SignalBody};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

/// Timeout for expected messages (ms).
pub const RECV_TIMEOUT_MS: u64 = 2000;

/// Window in which an unexpected message must NOT arrive (ms).
pub const SILENCE_WINDOW_MS: u64 = 300;

/// A raw signaling participant: one WebSocket connection speaking the
/// relay protocol, with helpers to wait for specific server messages.
pub struct TestPeer {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestPeer {
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        let url = format!("ws://{addr}/ws");
        let (ws, _) = connect_async(&url)
            .await
            .context("failed to connect test peer")?;
        Ok(Self { ws })
    }

    pub async fn send(&mut self, msg: &ClientMessage) -> Result<()> {
        let json = serde_json::to_string(msg)?;
        self.ws.send(Message::Text(json)).await?;
        Ok(())
    }

    pub async fn join(&mut self, room: &str, identity: &str) -> Result<()> {
        self.send(&ClientMessage::Join {
            room: RoomId::new(room),
            identity: Identity::new(identity),
        })
        .await
    }

    pub async fn send_signal(&mut self, to: PeerId, body: SignalBody) -> Result<()> {
        self.send(&ClientMessage::Signal { to, body }).await
    }

    /// Next decoded server message, or an error after the timeout.
    pub async fn recv(&mut self) -> Result<ServerMessage> {
        let deadline = Duration::from_millis(RECV_TIMEOUT_MS);
        loop {
            let msg = tokio::time::timeout(deadline, self.ws.next())
                .await
                .context("timed out waiting for server message")?;
            match msg {
                Some(Ok(Message::Text(text))) => {
                    return serde_json::from_str(&text).context("undecodable server message");
                }
                Some(Ok(Message::Close(_))) | None => bail!("connection closed"),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e.into()),
            }
        }
    }

    /// Wait for the join echo and return the server-assigned handle.
    pub async fn wait_joined(&mut self) -> Result<PeerId> {
        match self.recv().await? {
            ServerMessage::Joined { peer_id, .. } => Ok(peer_id),
            other => bail!("expected Joined, got {other:?}"),
        }
    }

    pub async fn wait_peer_joined(&mut self) -> Result<(Identity, PeerId)> {
        match self.recv().await? {
            ServerMessage::PeerJoined { identity, peer_id } => Ok((identity, peer_id)),
            other => bail!("expected PeerJoined, got {other:?}"),
        }
    }

    pub async fn wait_peer_left(&mut self) -> Result<PeerId> {
        match self.recv().await? {
            ServerMessage::PeerLeft { peer_id } => Ok(peer_id),
            other => bail!("expected PeerLeft, got {other:?}"),
        }
    }

    pub async fn wait_signal(&mut self) -> Result<(PeerId, SignalBody)> {
        match self.recv().await? {
            ServerMessage::Signal { from, body } => Ok((from, body)),
            other => bail!("expected Signal, got {other:?}"),
        }
    }

    /// Assert that nothing arrives for a short window.
    pub async fn expect_silence(&mut self) -> Result<()> {
        let window = Duration::from_millis(SILENCE_WINDOW_MS);
        match tokio::time::timeout(window, self.ws.next()).await {
            Err(_) => Ok(()),
            Ok(Some(Ok(Message::Text(text)))) => bail!("unexpected message: {text}"),
            Ok(_) => bail!("unexpected frame"),
        }
    }

    pub async fn close(mut self) -> Result<()> {
        self.ws.close(None).await?;
        Ok(())
    }
}
