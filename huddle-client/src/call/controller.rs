use crate::call::{CallCommand, CallConfig, CallEvent, CallHandle, CallState};
use crate::error::CallError;
use crate::media::{LocalMedia, MediaSource};
use crate::membership::{RoomEvent, RoomHandle};
use crate::negotiation::SessionNegotiator;
use crate::transport::{TransportError, TransportEvent};
use huddle_core::negotiation::offer_wins;
use huddle_core::{NegotiationState, NegotiationViolation, PeerId, SessionDescription, SignalBody};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Owns one call end to end: the negotiator, the media handle, and every
/// event source feeding the call. All transitions happen inside [`run`]'s
/// select loop, so the state is auditable in one place and overlapping
/// negotiation requests for the pair serialize by construction.
///
/// [`run`]: CallController::run
pub struct CallController {
    config: CallConfig,
    signaling: RoomHandle,
    commands: mpsc::Receiver<CallCommand>,
    room_events: mpsc::Receiver<RoomEvent>,
    transport_events: mpsc::Receiver<TransportEvent>,
    events: mpsc::Sender<CallEvent>,
    negotiator: SessionNegotiator,
    media_source: Arc<dyn MediaSource>,

    state: CallState,
    local_peer: Option<PeerId>,
    remote_peer: Option<PeerId>,
    local_media: Option<LocalMedia>,
    tracks_pushed: bool,
    pending_renegotiation: bool,
    ring_deadline: Option<Instant>,
}

impl CallController {
    pub fn new(
        config: CallConfig,
        signaling: RoomHandle,
        room_events: mpsc::Receiver<RoomEvent>,
        negotiator: SessionNegotiator,
        transport_events: mpsc::Receiver<TransportEvent>,
        media_source: Arc<dyn MediaSource>,
    ) -> (Self, CallHandle, mpsc::Receiver<CallEvent>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (event_tx, event_rx) = mpsc::channel(64);

        let controller = Self {
            config,
            signaling,
            commands: cmd_rx,
            room_events,
            transport_events,
            events: event_tx,
            negotiator,
            media_source,
            state: CallState::Idle,
            local_peer: None,
            remote_peer: None,
            local_media: None,
            tracks_pushed: false,
            pending_renegotiation: false,
            ring_deadline: None,
        };

        (controller, CallHandle { tx: cmd_tx }, event_rx)
    }

    pub fn state(&self) -> CallState {
        self.state
    }

    pub async fn run(mut self) {
        info!("call loop started");

        loop {
            let ring_deadline = self.ring_deadline;
            let ring = async move {
                match ring_deadline {
                    Some(at) => tokio::time::sleep_until(at).await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd).await,
                    None => self.teardown(None).await,
                },

                evt = self.room_events.recv() => match evt {
                    Some(evt) => self.handle_room_event(evt).await,
                    None => self.teardown(Some(CallError::SignalingLost)).await,
                },

                evt = self.transport_events.recv() => match evt {
                    Some(evt) => self.handle_transport_event(evt).await,
                    None => self.teardown(Some(TransportError::Closed.into())).await,
                },

                _ = ring => {
                    warn!("offer rang out with no answer");
                    self.teardown(Some(CallError::RingTimeout)).await;
                }
            }

            if self.state == CallState::Ended {
                break;
            }
        }

        info!("call loop finished");
    }

    async fn handle_command(&mut self, cmd: CallCommand) {
        match cmd {
            CallCommand::AddTrack(track) => {
                if let Err(e) = self.negotiator.add_local_track(track).await {
                    warn!("failed to attach local track: {e}");
                }
            }
            CallCommand::HangUp => self.teardown(None).await,
        }
    }

    async fn handle_room_event(&mut self, event: RoomEvent) {
        match event {
            RoomEvent::Joined { room, peer_id } => {
                debug!(%room, %peer_id, "room joined");
                self.local_peer = Some(peer_id);
            }

            RoomEvent::PeerJoined { identity, peer_id } => {
                if self.state != CallState::Idle {
                    debug!(%peer_id, "peer joined mid-call, ignoring");
                    return;
                }
                self.emit(CallEvent::PeerJoined { identity }).await;
                self.start_call(peer_id).await;
            }

            RoomEvent::PeerLeft { peer_id } => {
                if self.remote_peer.as_ref() == Some(&peer_id) {
                    info!(%peer_id, "call partner left");
                    self.teardown(Some(CallError::PeerGone)).await;
                } else {
                    debug!(%peer_id, "unrelated peer left");
                }
            }

            RoomEvent::Signal { from, body } => self.handle_signal(from, body).await,

            RoomEvent::Disconnected => {
                self.teardown(Some(CallError::SignalingLost)).await;
            }
        }
    }

    async fn handle_signal(&mut self, from: PeerId, body: SignalBody) {
        match body {
            SignalBody::CallOffer { description } => {
                self.handle_incoming_call(from, description).await;
            }
            SignalBody::CallAnswer { description } => {
                self.handle_call_accepted(from, description).await;
            }
            SignalBody::RenegotiationOffer { description } => {
                self.handle_renegotiation_offer(from, description).await;
            }
            SignalBody::RenegotiationAnswer { description } => {
                self.handle_renegotiation_answer(from, description).await;
            }
        }
    }

    /// Idle -> Ringing. We saw the peer arrive, so we dial: capture media,
    /// offer, send. Tracks are NOT attached yet — the first round is
    /// signaling-only, tracks follow once the answer lands.
    async fn start_call(&mut self, peer: PeerId) {
        self.remote_peer = Some(peer.clone());

        match self.media_source.acquire().await {
            Ok(media) => self.local_media = Some(media),
            Err(e) => {
                // Nothing was sent; the peer never learns a call was tried.
                warn!("media acquisition failed: {e}");
                self.remote_peer = None;
                self.emit(CallEvent::SetupFailed(e.into())).await;
                return;
            }
        }

        match self.negotiator.create_offer().await {
            Ok(offer) => {
                if self.send_signal(peer, SignalBody::CallOffer { description: offer })
                    .await
                {
                    self.ring_deadline = Some(Instant::now() + self.config.ring_timeout);
                    self.set_state(CallState::Ringing).await;
                }
            }
            Err(e) => {
                warn!("offer creation failed: {e}");
                self.release_media();
                self.remote_peer = None;
                self.emit(CallEvent::SetupFailed(e)).await;
            }
        }
    }

    /// Idle -> AwaitingOffer -> Negotiating -> Active, the callee path.
    async fn handle_incoming_call(&mut self, from: PeerId, offer: SessionDescription) {
        if self.state != CallState::Idle {
            warn!(%from, state = ?self.state, "call offer discarded");
            return;
        }

        self.remote_peer = Some(from.clone());
        self.set_state(CallState::AwaitingOffer).await;

        match self.media_source.acquire().await {
            Ok(media) => self.local_media = Some(media),
            Err(e) => {
                warn!("media acquisition failed: {e}");
                self.remote_peer = None;
                self.emit(CallEvent::SetupFailed(e.into())).await;
                self.set_state(CallState::Idle).await;
                return;
            }
        }

        match self.negotiator.create_answer(offer).await {
            Ok(answer) => {
                self.set_state(CallState::Negotiating).await;
                if self.send_signal(from, SignalBody::CallAnswer { description: answer })
                    .await
                {
                    self.set_state(CallState::Active).await;
                }
            }
            Err(CallError::Negotiation(v)) => {
                warn!("call offer violates negotiation state, discarded: {v}");
                self.release_media();
                self.remote_peer = None;
                self.set_state(CallState::Idle).await;
            }
            Err(e) => {
                warn!("answering failed: {e}");
                self.release_media();
                self.remote_peer = None;
                self.emit(CallEvent::SetupFailed(e)).await;
                self.set_state(CallState::Idle).await;
            }
        }
    }

    /// Ringing -> Active. Apply the answer, then push local tracks; the
    /// engine reacts with `NegotiationNeeded` and the first renegotiation
    /// round carries the media.
    async fn handle_call_accepted(&mut self, from: PeerId, answer: SessionDescription) {
        if self.state != CallState::Ringing || self.remote_peer.as_ref() != Some(&from) {
            warn!(%from, state = ?self.state, "call answer discarded");
            return;
        }

        match self.negotiator.apply_answer(answer).await {
            Ok(()) => {
                self.ring_deadline = None;
                self.push_local_tracks().await;
                self.set_state(CallState::Active).await;
            }
            Err(CallError::Negotiation(v)) => {
                warn!("call answer violates negotiation state, discarded: {v}");
            }
            Err(e) => {
                warn!("applying answer failed: {e}");
                self.teardown(Some(e)).await;
            }
        }
    }

    /// Renegotiation offers arrive only once the call is up. Glare is
    /// settled by the stable handle order: the losing side abandons its
    /// own round, answers, and re-offers afterwards.
    async fn handle_renegotiation_offer(&mut self, from: PeerId, offer: SessionDescription) {
        if self.remote_peer.as_ref() != Some(&from)
            || !matches!(self.state, CallState::Active | CallState::Negotiating)
        {
            warn!(%from, state = ?self.state, "renegotiation offer discarded");
            return;
        }

        match self.negotiator.create_answer(offer.clone()).await {
            Ok(answer) => {
                self.send_signal(from, SignalBody::RenegotiationAnswer { description: answer })
                    .await;
            }
            Err(CallError::Negotiation(NegotiationViolation::Glare)) => {
                let we_win = match (&self.local_peer, &self.remote_peer) {
                    (Some(local), Some(remote)) => offer_wins(local, remote),
                    // No handle yet: yield, the peer's round is as good.
                    _ => false,
                };

                if we_win {
                    debug!("glare: our offer wins, remote offer discarded");
                    return;
                }

                debug!("glare: yielding to the remote offer");
                self.negotiator.abandon_offer();
                self.pending_renegotiation = true;

                match self.negotiator.create_answer(offer).await {
                    Ok(answer) => {
                        self.send_signal(
                            from,
                            SignalBody::RenegotiationAnswer { description: answer },
                        )
                        .await;
                        self.retry_pending_renegotiation().await;
                    }
                    Err(e) => warn!("yielded renegotiation failed: {e}"),
                }
            }
            Err(CallError::Negotiation(v)) => {
                warn!("renegotiation offer discarded: {v}");
            }
            Err(e) => warn!("renegotiation failed: {e}"),
        }
    }

    async fn handle_renegotiation_answer(&mut self, from: PeerId, answer: SessionDescription) {
        if self.remote_peer.as_ref() != Some(&from) {
            warn!(%from, "renegotiation answer from a stranger discarded");
            return;
        }

        match self.negotiator.apply_answer(answer).await {
            Ok(()) => self.retry_pending_renegotiation().await,
            Err(CallError::Negotiation(v)) => {
                warn!("renegotiation answer discarded: {v}");
            }
            Err(e) => warn!("applying renegotiation answer failed: {e}"),
        }
    }

    async fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::NegotiationNeeded => {
                // Before the call is up the initial offer covers it.
                if self.state == CallState::Active {
                    self.begin_renegotiation().await;
                } else {
                    debug!(state = ?self.state, "negotiation-needed ignored");
                }
            }

            TransportEvent::Track(track) => {
                debug!(id = %track.id, "remote media available");
                self.emit(CallEvent::RemoteTrack(track)).await;
            }

            TransportEvent::Closed => {
                if self.state != CallState::Idle {
                    self.teardown(Some(TransportError::Closed.into())).await;
                }
            }
        }
    }

    /// Start a renegotiation round, or queue it if one is in flight.
    /// Queued needs collapse into a single retry, so K rapid track
    /// changes cost at most K rounds.
    async fn begin_renegotiation(&mut self) {
        if self.negotiator.state() != NegotiationState::Stable {
            self.pending_renegotiation = true;
            return;
        }
        let Some(to) = self.remote_peer.clone() else {
            return;
        };

        match self.negotiator.create_offer().await {
            Ok(offer) => {
                self.send_signal(to, SignalBody::RenegotiationOffer { description: offer })
                    .await;
            }
            Err(CallError::Negotiation(NegotiationViolation::OfferInFlight)) => {
                self.pending_renegotiation = true;
            }
            Err(e) => warn!("renegotiation offer failed: {e}"),
        }
    }

    async fn retry_pending_renegotiation(&mut self) {
        if self.pending_renegotiation && self.negotiator.state() == NegotiationState::Stable {
            self.pending_renegotiation = false;
            self.begin_renegotiation().await;
        }
    }

    /// Two-phase handshake, second phase: the answered session exists,
    /// now the captured tracks go onto the connection.
    async fn push_local_tracks(&mut self) {
        if self.tracks_pushed {
            return;
        }
        let tracks: Vec<_> = self
            .local_media
            .as_ref()
            .map(|m| m.tracks().to_vec())
            .unwrap_or_default();

        for track in tracks {
            if let Err(e) = self.negotiator.add_local_track(track).await {
                warn!("failed to push local track: {e}");
            }
        }
        self.tracks_pushed = true;
    }

    async fn send_signal(&mut self, to: PeerId, body: SignalBody) -> bool {
        if self.signaling.send_signal(to, body).await.is_err() {
            self.teardown(Some(CallError::SignalingLost)).await;
            return false;
        }
        true
    }

    fn release_media(&mut self) {
        if self.local_media.take().is_some() {
            debug!("local media released");
        }
    }

    /// Single exit path. Discards in-flight negotiation, releases capture,
    /// closes the transport. Nothing can apply a stale description after
    /// this because the loop stops once the state is `Ended`.
    async fn teardown(&mut self, error: Option<CallError>) {
        if self.state == CallState::Ended {
            return;
        }

        self.ring_deadline = None;
        self.pending_renegotiation = false;
        self.release_media();
        self.negotiator.close().await;

        if let Some(e) = error {
            self.emit(CallEvent::Failed(e)).await;
        }
        self.set_state(CallState::Ended).await;
    }

    async fn set_state(&mut self, state: CallState) {
        if self.state == state {
            return;
        }
        info!(from = ?self.state, to = ?state, "call state changed");
        self.state = state;
        self.emit(CallEvent::StateChanged(state)).await;
    }

    async fn emit(&self, event: CallEvent) {
        let _ = self.events.send(event).await;
    }
}
