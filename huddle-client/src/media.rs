use std::sync::Arc;
use thiserror::Error;
use webrtc::track::track_local::TrackLocal;

/// A local media track ready to be attached to the transport. The track
/// payload itself is the media engine's business.
pub type LocalTrack = Arc<dyn TrackLocal + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Audio,
    Video,
}

/// Descriptor for a track the remote side started sending. Media bytes
/// flow inside the engine; the controller only announces arrival.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrack {
    pub id: String,
    pub kind: TrackKind,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MediaError {
    #[error("capture permission denied")]
    PermissionDenied,

    #[error("no capture device available")]
    DeviceUnavailable,

    #[error("media engine failure: {0}")]
    Engine(String),
}

/// Source of local capture tracks. Device enumeration and permission
/// prompts live behind this seam, outside the call subsystem.
#[async_trait::async_trait]
pub trait MediaSource: Send + Sync {
    async fn acquire(&self) -> Result<LocalMedia, MediaError>;
}

/// Acquired capture handle. The devices stay claimed for exactly as long
/// as this value lives; every controller exit path drops it.
pub struct LocalMedia {
    tracks: Vec<LocalTrack>,
    on_release: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl LocalMedia {
    pub fn new(tracks: Vec<LocalTrack>) -> Self {
        Self {
            tracks,
            on_release: None,
        }
    }

    /// Attach a hook that runs when the media is released. The production
    /// source frees devices here; tests observe release with it.
    pub fn with_release_hook(
        tracks: Vec<LocalTrack>,
        hook: impl FnOnce() + Send + Sync + 'static,
    ) -> Self {
        Self {
            tracks,
            on_release: Some(Box::new(hook)),
        }
    }

    pub fn tracks(&self) -> &[LocalTrack] {
        &self.tracks
    }
}

impl Drop for LocalMedia {
    fn drop(&mut self) {
        if let Some(hook) = self.on_release.take() {
            hook();
        }
    }
}

impl std::fmt::Debug for LocalMedia {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalMedia")
            .field("tracks", &self.tracks.len())
            .finish()
    }
}
