pub mod model;
pub mod negotiation;

pub use model::{
    ClientMessage, Identity, PeerId, RoomId, SdpKind, ServerMessage, SessionDescription,
    SignalBody,
};
pub use negotiation::{NegotiationState, NegotiationViolation};
