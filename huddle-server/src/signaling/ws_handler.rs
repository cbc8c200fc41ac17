use crate::RelayService;
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use huddle_core::{ClientMessage, PeerId};
use tokio::sync::mpsc;
use tracing::{info, warn};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(relay): State<RelayService>,
) -> impl IntoResponse {
    // The handle is bound to this connection, not the participant: a
    // reconnect is a new peer as far as the protocol is concerned.
    let peer_id = PeerId::new();

    ws.on_upgrade(move |socket| handle_socket(socket, peer_id, relay))
}

async fn handle_socket(socket: WebSocket, peer_id: PeerId, relay: RelayService) {
    info!(%peer_id, "new signaling connection");

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    relay.register(peer_id.clone(), tx);

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let relay = relay.clone();
        let peer_id = peer_id.clone();

        async move {
            let mut joined = false;

            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(ClientMessage::Join { room, identity }) => {
                            // One membership per connection.
                            if joined {
                                warn!(%peer_id, "join after join ignored");
                                continue;
                            }
                            joined = true;
                            relay.join(peer_id.clone(), room, identity);
                        }
                        Ok(ClientMessage::Signal { to, body }) => {
                            relay.relay(peer_id.clone(), &to, body);
                        }
                        Err(e) => warn!(%peer_id, "invalid client message: {e}"),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    relay.disconnect(&peer_id);
    info!(%peer_id, "signaling connection closed");
}
