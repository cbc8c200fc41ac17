use crate::room::RoomRegistry;
use axum::extract::ws::Message;
use dashmap::DashMap;
use huddle_core::{Identity, PeerId, RoomId, ServerMessage, SignalBody};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

struct RelayInner {
    peers: DashMap<PeerId, mpsc::UnboundedSender<Message>>,
    rooms: RoomRegistry,
}

/// The signaling hub: a connection registry plus the room table. Holds no
/// call state — every message either mutates membership or is forwarded
/// verbatim. Delivery is best-effort: a signal to a handle that is no
/// longer connected is dropped, not retried.
#[derive(Clone)]
pub struct RelayService {
    inner: Arc<RelayInner>,
}

impl RelayService {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RelayInner {
                peers: DashMap::new(),
                rooms: RoomRegistry::new(),
            }),
        }
    }

    pub fn rooms(&self) -> &RoomRegistry {
        &self.inner.rooms
    }

    pub fn register(&self, peer_id: PeerId, tx: mpsc::UnboundedSender<Message>) {
        self.inner.peers.insert(peer_id, tx);
    }

    pub fn unregister(&self, peer_id: &PeerId) {
        self.inner.peers.remove(peer_id);
    }

    /// Enter `peer` into `room` and run the join fan-out: the joiner gets
    /// the `Joined` echo with its handle, everyone already present gets
    /// `PeerJoined`. The joiner is told nothing about existing occupants —
    /// it waits passively for the call.
    pub fn join(&self, peer_id: PeerId, room: RoomId, identity: Identity) {
        let Some(outcome) = self
            .inner
            .rooms
            .join(&room, peer_id.clone(), identity.clone())
        else {
            warn!(%peer_id, %room, "duplicate join ignored");
            return;
        };

        self.send(
            &peer_id,
            &ServerMessage::Joined {
                room,
                peer_id: peer_id.clone(),
            },
        );

        for occupant in outcome.existing {
            self.send(
                &occupant.peer_id,
                &ServerMessage::PeerJoined {
                    identity: identity.clone(),
                    peer_id: peer_id.clone(),
                },
            );
        }
    }

    /// Forward a directed signal, restamped with the sender's handle. The
    /// body is never inspected here.
    pub fn relay(&self, from: PeerId, to: &PeerId, body: SignalBody) {
        self.send(to, &ServerMessage::Signal { from, body });
    }

    /// Connection teardown: leave the room, tell the remaining occupants,
    /// drop the egress channel. Messages already in flight toward the
    /// closed connection are lost; there is no delivery guarantee past
    /// this point.
    pub fn disconnect(&self, peer_id: &PeerId) {
        if let Some((room, remaining)) = self.inner.rooms.leave(peer_id) {
            debug!(%peer_id, %room, "notifying room of departure");
            for occupant in remaining {
                self.send(
                    &occupant.peer_id,
                    &ServerMessage::PeerLeft {
                        peer_id: peer_id.clone(),
                    },
                );
            }
        }
        self.unregister(peer_id);
    }

    fn send(&self, peer_id: &PeerId, msg: &ServerMessage) {
        let Some(peer) = self.inner.peers.get(peer_id) else {
            debug!(%peer_id, "dropping message for disconnected handle");
            return;
        };

        match serde_json::to_string(msg) {
            Ok(json) => {
                if peer.send(Message::Text(json.into())).is_err() {
                    debug!(%peer_id, "egress channel closed, message dropped");
                }
            }
            Err(e) => error!(%peer_id, "failed to serialize server message: {e}"),
        }
    }
}

impl Default for RelayService {
    fn default() -> Self {
        Self::new()
    }
}
