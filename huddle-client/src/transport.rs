use crate::media::{LocalTrack, RemoteTrack};
use huddle_core::SessionDescription;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("media engine error: {0}")]
    Engine(String),

    #[error("transport closed")]
    Closed,
}

/// Events the transport pushes up to the call controller. Delivered on
/// the channel handed out at construction, never via ad-hoc listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The set of flowing media changed; a new offer/answer round is
    /// needed. Fired by the engine when tracks are attached after the
    /// session is up.
    NegotiationNeeded,
    /// The remote side started sending a track.
    Track(RemoteTrack),
    /// The underlying connection died.
    Closed,
}

/// Seam over the platform's real-time transport. The production
/// implementation composes the engine's five primitives —
/// create_offer/create_answer/set_local_description/set_remote_description/
/// add_track — into the negotiator-grade operations below, plus the
/// `negotiationneeded` and `track` events as [`TransportEvent`]s.
#[async_trait::async_trait]
pub trait MediaTransport: Send + Sync {
    /// Fresh offer from the current local tracks, installed as the local
    /// description before it is returned.
    async fn create_offer(&self) -> Result<SessionDescription, TransportError>;

    /// Install the remote offer and produce the matching answer, installed
    /// locally before it is returned. Installing an offer while our own
    /// offer is pending follows the platform's rollback semantics; the
    /// negotiator only does this on the losing side of glare.
    async fn create_answer(
        &self,
        remote_offer: SessionDescription,
    ) -> Result<SessionDescription, TransportError>;

    /// Install the remote answer, completing the round.
    async fn apply_answer(&self, remote_answer: SessionDescription)
    -> Result<(), TransportError>;

    /// Attach a local track. With a remote description already installed
    /// the engine reacts with `NegotiationNeeded`.
    async fn add_track(&self, track: LocalTrack) -> Result<(), TransportError>;

    async fn close(&self) -> Result<(), TransportError>;
}
