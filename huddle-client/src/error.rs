use crate::media::MediaError;
use crate::transport::TransportError;
use huddle_core::NegotiationViolation;
use thiserror::Error;

/// Everything that can end or degrade a call. Negotiation violations are
/// handled by discarding the offending message; the rest tear the call
/// down through the `Ended` path.
#[derive(Debug, Error)]
pub enum CallError {
    #[error("media acquisition failed: {0}")]
    Media(#[from] MediaError),

    #[error(transparent)]
    Negotiation(#[from] NegotiationViolation),

    #[error("media transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("signaling connection lost")]
    SignalingLost,

    #[error("no answer before the ring timeout")]
    RingTimeout,

    #[error("peer left the room")]
    PeerGone,
}
