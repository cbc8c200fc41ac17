use dashmap::DashMap;
use huddle_core::{Identity, PeerId, RoomId};
use tracing::{debug, info};

/// One room member as the relay sees it.
#[derive(Debug, Clone)]
pub struct Occupant {
    pub peer_id: PeerId,
    pub identity: Identity,
}

#[derive(Debug, Default)]
struct Room {
    occupants: Vec<Occupant>,
    /// The occupant that initiates the call toward later joiners. Set when
    /// the room first pairs up and kept until that occupant leaves, so
    /// retry logic on both sides agrees on who dials.
    initiator: Option<PeerId>,
}

/// Result of a join: the occupants that were already present. Each of them
/// is told about the joiner; the joiner itself waits to be called.
#[derive(Debug)]
pub struct JoinOutcome {
    pub existing: Vec<Occupant>,
}

/// Room membership table. Rooms exist from first join to last leave; the
/// relay holds no other call state. All mutation goes through the entry
/// API so concurrent joins to one room serialize, while traffic for other
/// rooms stays on other shards.
pub struct RoomRegistry {
    rooms: DashMap<RoomId, Room>,
    membership: DashMap<PeerId, RoomId>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
            membership: DashMap::new(),
        }
    }

    /// Add `peer` to `room`, creating the room on first join. Returns the
    /// occupants that were already there. A peer already in a room is not
    /// moved; re-joins return `None`.
    pub fn join(
        &self,
        room_id: &RoomId,
        peer_id: PeerId,
        identity: Identity,
    ) -> Option<JoinOutcome> {
        if self.membership.contains_key(&peer_id) {
            return None;
        }

        let mut room = self.rooms.entry(room_id.clone()).or_default();
        let existing = room.occupants.clone();

        room.occupants.push(Occupant {
            peer_id: peer_id.clone(),
            identity,
        });

        // First pairing: the occupant that was already waiting becomes the
        // initiator and dials out when it learns of the joiner.
        if room.initiator.is_none() {
            if let Some(first) = existing.first() {
                room.initiator = Some(first.peer_id.clone());
            }
        }
        drop(room);

        self.membership.insert(peer_id.clone(), room_id.clone());
        info!(%room_id, %peer_id, "peer joined room");

        Some(JoinOutcome { existing })
    }

    /// Remove `peer` from whatever room it occupies. Returns the room and
    /// the remaining occupants so the caller can broadcast `PeerLeft`.
    /// The room record is dropped once the last occupant is gone.
    pub fn leave(&self, peer_id: &PeerId) -> Option<(RoomId, Vec<Occupant>)> {
        let (_, room_id) = self.membership.remove(peer_id)?;

        let mut remaining = Vec::new();
        let mut empty = false;

        if let Some(mut room) = self.rooms.get_mut(&room_id) {
            room.occupants.retain(|o| &o.peer_id != peer_id);
            if room.initiator.as_ref() == Some(peer_id) {
                room.initiator = None;
            }
            remaining = room.occupants.clone();
            empty = room.occupants.is_empty();
        }

        if empty {
            self.rooms.remove(&room_id);
            debug!(%room_id, "room destroyed");
        }

        info!(%room_id, %peer_id, "peer left room");
        Some((room_id, remaining))
    }

    /// The persisted initiator of `room`, if it has paired up.
    pub fn initiator(&self, room_id: &RoomId) -> Option<PeerId> {
        self.rooms.get(room_id).and_then(|r| r.initiator.clone())
    }

    pub fn occupant_count(&self, room_id: &RoomId) -> usize {
        self.rooms.get(room_id).map_or(0, |r| r.occupants.len())
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}
