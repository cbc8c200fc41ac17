use crate::model::peer::PeerId;
use crate::model::room::{Identity, RoomId};
use crate::model::session::SessionDescription;
use serde::{Deserialize, Serialize};

/// Call payload carried inside a directed `Signal`. The relay never matches
/// on this union: it routes on the target handle alone, which keeps the
/// relay independent of the negotiation protocol version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", content = "d")]
pub enum SignalBody {
    CallOffer { description: SessionDescription },
    CallAnswer { description: SessionDescription },
    RenegotiationOffer { description: SessionDescription },
    RenegotiationAnswer { description: SessionDescription },
}

/// Client -> relay.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", content = "d")]
pub enum ClientMessage {
    /// Enter a room. Accepted once per connection.
    Join { room: RoomId, identity: Identity },
    /// Forward `body` to the connection identified by `to`.
    Signal { to: PeerId, body: SignalBody },
}

/// Relay -> client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", content = "d")]
pub enum ServerMessage {
    /// Join echo to the joiner, carrying its server-assigned handle.
    Joined { room: RoomId, peer_id: PeerId },
    /// Sent to participants already in the room when a new peer arrives.
    /// The joiner itself does not get this: it waits to be called.
    PeerJoined { identity: Identity, peer_id: PeerId },
    /// A room member's connection went away.
    PeerLeft { peer_id: PeerId },
    /// A forwarded `Signal`, restamped with the sender's handle.
    Signal { from: PeerId, body: SignalBody },
}
