mod peer;
mod room;
mod session;
mod signaling;

pub use peer::PeerId;
pub use room::{Identity, RoomId};
pub use session::{SdpKind, SessionDescription};
pub use signaling::{ClientMessage, ServerMessage, SignalBody};
