use crate::error::CallError;
use crate::media::RemoteTrack;
use huddle_core::Identity;
use std::time::Duration;

/// Outer call lifecycle. Renegotiation rounds do not show up here; they
/// only move the inner negotiation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Idle,
    /// Offer sent, waiting for the answer (caller side).
    Ringing,
    /// Incoming offer being processed (callee side).
    AwaitingOffer,
    Negotiating,
    Active,
    Ended,
}

#[derive(Debug)]
pub enum CallEvent {
    StateChanged(CallState),
    /// A peer arrived in our room; the controller is dialing it.
    PeerJoined { identity: Identity },
    /// The remote side started sending media. Can arrive at any point
    /// once negotiation has begun.
    RemoteTrack(RemoteTrack),
    /// Call setup failed; the controller returned to `Idle`.
    SetupFailed(CallError),
    /// The call ended abnormally (peer gone, timeout, transport death).
    Failed(CallError),
}

#[derive(Debug, Clone)]
pub struct CallConfig {
    /// How long a sent offer may ring before the call is abandoned.
    pub ring_timeout: Duration,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            ring_timeout: Duration::from_secs(30),
        }
    }
}
