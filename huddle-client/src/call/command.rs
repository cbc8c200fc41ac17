use crate::media::LocalTrack;
use tokio::sync::mpsc;

/// Commands from the embedding application into the call loop.
pub enum CallCommand {
    /// Attach another local track mid-call ("send stream"). Triggers a
    /// renegotiation round once the session is up.
    AddTrack(LocalTrack),
    /// Tear the call down locally.
    HangUp,
}

/// Application-side handle to a running [`CallController`]. Sends become
/// no-ops once the call has ended.
#[derive(Clone)]
pub struct CallHandle {
    pub(crate) tx: mpsc::Sender<CallCommand>,
}

impl CallHandle {
    pub async fn add_track(&self, track: LocalTrack) {
        let _ = self.tx.send(CallCommand::AddTrack(track)).await;
    }

    pub async fn hang_up(&self) {
        let _ = self.tx.send(CallCommand::HangUp).await;
    }
}
