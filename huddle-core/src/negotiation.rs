//! Offer/answer negotiation state, kept free of IO so the client's
//! negotiator and its tests share one set of transition rules.
//!
//! Exactly one round may be in flight per pair and direction. Messages
//! that violate a guard are discarded by the caller, never applied to
//! the media engine.

use crate::model::PeerId;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    /// No round has run yet.
    Idle,
    /// A local offer is out; waiting for the remote answer.
    OfferSent,
    /// A remote offer was applied; the local answer is not out yet.
    AnswerPending,
    /// The last round completed on both descriptions.
    Stable,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationViolation {
    #[error("an offer is already in flight for this direction")]
    OfferInFlight,
    #[error("remote offer arrived while answering a previous one")]
    UnexpectedOffer,
    #[error("both sides offered at once")]
    Glare,
    #[error("answer does not match an in-flight offer")]
    UnexpectedAnswer,
}

impl NegotiationState {
    /// Guard for producing a local offer (initial or renegotiation).
    pub fn local_offer(self) -> Result<Self, NegotiationViolation> {
        match self {
            Self::Idle | Self::Stable => Ok(Self::OfferSent),
            Self::OfferSent | Self::AnswerPending => Err(NegotiationViolation::OfferInFlight),
        }
    }

    /// Guard for accepting a remote offer.
    pub fn remote_offer(self) -> Result<Self, NegotiationViolation> {
        match self {
            Self::Idle | Self::Stable => Ok(Self::AnswerPending),
            Self::OfferSent => Err(NegotiationViolation::Glare),
            Self::AnswerPending => Err(NegotiationViolation::UnexpectedOffer),
        }
    }

    /// Guard for sending the local answer to the offer accepted above.
    pub fn local_answer(self) -> Result<Self, NegotiationViolation> {
        match self {
            Self::AnswerPending => Ok(Self::Stable),
            _ => Err(NegotiationViolation::UnexpectedAnswer),
        }
    }

    /// Guard for applying the remote answer to our in-flight offer.
    /// A duplicate answer after `Stable` fails here instead of reaching
    /// the media engine twice.
    pub fn remote_answer(self) -> Result<Self, NegotiationViolation> {
        match self {
            Self::OfferSent => Ok(Self::Stable),
            _ => Err(NegotiationViolation::UnexpectedAnswer),
        }
    }
}

/// Glare tie-break: when both sides offer at once, the side with the
/// smaller handle wins the round. Stable across retries because handles
/// are fixed for the life of the connection.
pub fn offer_wins(local: &PeerId, remote: &PeerId) -> bool {
    local < remote
}
