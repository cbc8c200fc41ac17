pub mod call;
pub mod error;
pub mod media;
pub mod membership;
pub mod negotiation;
pub mod rtc;
pub mod transport;

pub use call::{CallConfig, CallController, CallEvent, CallHandle, CallState};
pub use error::CallError;
pub use media::{LocalMedia, LocalTrack, MediaError, MediaSource, RemoteTrack, TrackKind};
pub use membership::{RoomClient, RoomEvent, RoomHandle};
pub use negotiation::SessionNegotiator;
pub use rtc::{RtcConfig, RtcMediaSource, RtcTransport};
pub use transport::{MediaTransport, TransportError, TransportEvent};
