//! `webrtc`-engine implementations of the media seams.

use crate::media::{LocalMedia, LocalTrack, MediaError, MediaSource, RemoteTrack, TrackKind};
use crate::transport::{MediaTransport, TransportError, TransportEvent};
use huddle_core::SessionDescription;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{MIME_TYPE_OPUS, MIME_TYPE_VP8, MediaEngine};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::{RTCRtpCodecCapability, RTPCodecType};
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

impl From<webrtc::Error> for TransportError {
    fn from(e: webrtc::Error) -> Self {
        TransportError::Engine(e.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct RtcConfig {
    /// STUN/TURN urls handed down by the host platform.
    pub ice_servers: Vec<String>,
    /// How long to wait for candidate gathering before shipping a
    /// description. The protocol carries no separate candidate messages,
    /// so descriptions go out complete.
    pub gather_timeout: Duration,
}

impl Default for RtcConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![],
            gather_timeout: Duration::from_secs(3),
        }
    }
}

/// [`MediaTransport`] over an `RTCPeerConnection`. Engine callbacks are
/// bridged onto the event channel handed out by [`RtcTransport::new`];
/// nothing else registers listeners on the connection.
pub struct RtcTransport {
    pc: Arc<RTCPeerConnection>,
    gather_timeout: Duration,
}

impl RtcTransport {
    pub async fn new(
        config: RtcConfig,
    ) -> Result<(Self, mpsc::Receiver<TransportEvent>), TransportError> {
        let mut media_engine = MediaEngine::default();
        media_engine.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut media_engine)?;

        let api = APIBuilder::new()
            .with_media_engine(media_engine)
            .with_interceptor_registry(registry)
            .build();

        let ice_servers = if config.ice_servers.is_empty() {
            vec![]
        } else {
            vec![RTCIceServer {
                urls: config.ice_servers,
                ..Default::default()
            }]
        };

        let pc = Arc::new(
            api.new_peer_connection(RTCConfiguration {
                ice_servers,
                ..Default::default()
            })
            .await?,
        );

        let (event_tx, event_rx) = mpsc::channel(64);

        let nego_tx = event_tx.clone();
        pc.on_negotiation_needed(Box::new(move || {
            let tx = nego_tx.clone();
            Box::pin(async move {
                let _ = tx.send(TransportEvent::NegotiationNeeded).await;
            })
        }));

        let track_tx = event_tx.clone();
        pc.on_track(Box::new(move |track, _receiver, _transceiver| {
            let tx = track_tx.clone();
            Box::pin(async move {
                let kind = match track.kind() {
                    RTPCodecType::Audio => TrackKind::Audio,
                    RTPCodecType::Video => TrackKind::Video,
                    _ => return,
                };
                let id = track.ssrc().to_string();
                debug!(%id, ?kind, "remote track started");
                let _ = tx
                    .send(TransportEvent::Track(RemoteTrack { id, kind }))
                    .await;
            })
        }));

        let state_tx = event_tx.clone();
        pc.on_peer_connection_state_change(Box::new(move |state: RTCPeerConnectionState| {
            let tx = state_tx.clone();
            Box::pin(async move {
                debug!(?state, "peer connection state changed");
                match state {
                    RTCPeerConnectionState::Failed
                    | RTCPeerConnectionState::Disconnected
                    | RTCPeerConnectionState::Closed => {
                        let _ = tx.send(TransportEvent::Closed).await;
                    }
                    _ => {}
                }
            })
        }));

        Ok((
            Self {
                pc,
                gather_timeout: config.gather_timeout,
            },
            event_rx,
        ))
    }

    /// Wait out candidate gathering and return the completed local
    /// description.
    async fn gathered_local_description(
        &self,
    ) -> Result<RTCSessionDescription, TransportError> {
        let mut gathered = self.pc.gathering_complete_promise().await;
        let _ = tokio::time::timeout(self.gather_timeout, gathered.recv()).await;

        self.pc
            .local_description()
            .await
            .ok_or_else(|| TransportError::Engine("local description missing".into()))
    }
}

#[async_trait::async_trait]
impl MediaTransport for RtcTransport {
    async fn create_offer(&self) -> Result<SessionDescription, TransportError> {
        let offer = self.pc.create_offer(None).await?;
        self.pc.set_local_description(offer).await?;
        let complete = self.gathered_local_description().await?;
        Ok(SessionDescription::offer(complete.sdp))
    }

    async fn create_answer(
        &self,
        remote_offer: SessionDescription,
    ) -> Result<SessionDescription, TransportError> {
        let offer = RTCSessionDescription::offer(remote_offer.sdp)?;
        self.pc.set_remote_description(offer).await?;

        let answer = self.pc.create_answer(None).await?;
        self.pc.set_local_description(answer).await?;
        let complete = self.gathered_local_description().await?;
        Ok(SessionDescription::answer(complete.sdp))
    }

    async fn apply_answer(
        &self,
        remote_answer: SessionDescription,
    ) -> Result<(), TransportError> {
        let answer = RTCSessionDescription::answer(remote_answer.sdp)?;
        self.pc.set_remote_description(answer).await?;
        Ok(())
    }

    async fn add_track(&self, track: LocalTrack) -> Result<(), TransportError> {
        self.pc.add_track(track).await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.pc.close().await?;
        Ok(())
    }
}

/// Stand-in for platform capture: hands out engine-backed audio/video
/// tracks. Real device capture feeds samples into these tracks outside
/// this subsystem.
pub struct RtcMediaSource;

#[async_trait::async_trait]
impl MediaSource for RtcMediaSource {
    async fn acquire(&self) -> Result<LocalMedia, MediaError> {
        let audio = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_string(),
                ..Default::default()
            },
            "audio".to_string(),
            "huddle".to_string(),
        ));
        let video = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_VP8.to_string(),
                ..Default::default()
            },
            "video".to_string(),
            "huddle".to_string(),
        ));

        Ok(LocalMedia::new(vec![audio, video]))
    }
}
