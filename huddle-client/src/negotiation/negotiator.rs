use crate::error::CallError;
use crate::media::LocalTrack;
use crate::transport::MediaTransport;
use huddle_core::{NegotiationState, NegotiationViolation, SdpKind, SessionDescription};
use std::sync::Arc;
use tracing::debug;

/// Drives offer/answer rounds against one media transport, refusing
/// anything the [`NegotiationState`] guards reject. State only advances
/// after the transport accepted the operation, so a failed engine call
/// leaves the round where it was.
pub struct SessionNegotiator {
    transport: Arc<dyn MediaTransport>,
    state: NegotiationState,
}

impl SessionNegotiator {
    pub fn new(transport: Arc<dyn MediaTransport>) -> Self {
        Self {
            transport,
            state: NegotiationState::Idle,
        }
    }

    pub fn state(&self) -> NegotiationState {
        self.state
    }

    /// Start a round: fresh offer from the current local tracks. At most
    /// one in flight; a second call before the answer arrives is refused.
    pub async fn create_offer(&mut self) -> Result<SessionDescription, CallError> {
        let next = self.state.local_offer()?;
        let offer = self.transport.create_offer().await?;
        self.state = next;
        debug!(state = ?self.state, "local offer installed");
        Ok(offer)
    }

    /// Answer a remote offer, completing the round on our side.
    pub async fn create_answer(
        &mut self,
        remote_offer: SessionDescription,
    ) -> Result<SessionDescription, CallError> {
        if remote_offer.kind != SdpKind::Offer {
            return Err(NegotiationViolation::UnexpectedOffer.into());
        }
        let pending = self.state.remote_offer()?;
        let answer = self.transport.create_answer(remote_offer).await?;
        self.state = pending.local_answer()?;
        debug!(state = ?self.state, "remote offer answered");
        Ok(answer)
    }

    /// Apply the remote answer to our in-flight offer. Duplicates are
    /// refused before they reach the engine.
    pub async fn apply_answer(
        &mut self,
        remote_answer: SessionDescription,
    ) -> Result<(), CallError> {
        if remote_answer.kind != SdpKind::Answer {
            return Err(NegotiationViolation::UnexpectedAnswer.into());
        }
        let next = self.state.remote_answer()?;
        self.transport.apply_answer(remote_answer).await?;
        self.state = next;
        debug!(state = ?self.state, "remote answer applied");
        Ok(())
    }

    /// Attach a local track. Renegotiation, if needed, arrives from the
    /// transport as an event; no state changes here.
    pub async fn add_local_track(&self, track: LocalTrack) -> Result<(), CallError> {
        self.transport.add_track(track).await?;
        Ok(())
    }

    /// Discard our in-flight offer after losing a glare tie-break. The
    /// winner's offer is then answered normally; the engine rolls the
    /// abandoned local description back when the remote offer lands.
    pub fn abandon_offer(&mut self) {
        debug!("abandoning in-flight local offer");
        self.state = NegotiationState::Stable;
    }

    pub async fn close(&self) {
        if let Err(e) = self.transport.close().await {
            debug!("transport close failed: {e}");
        }
    }
}
