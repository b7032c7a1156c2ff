use std::sync::mpsc::Receiver;
use std::time::Instant;

use crate::call_manager::call_phase::CallPhase;
use crate::call_manager::media::{LocalMedia, MediaTrack};
use crate::call_manager::peer_connection::{PeerConnection, PeerEvent};
use crate::signaling::protocol::{ParticipantId, SessionDescription};

/// Everything one client knows about its (single) call.
pub struct ConnectionState {
    pub local_id: ParticipantId,
    pub peer_id: Option<ParticipantId>,
    pub phase: CallPhase,
    /// Offer received while ringing; consumed by accept.
    pub pending_offer: Option<SessionDescription>,
    pub local_media: Option<Box<dyn LocalMedia>>,
    pub remote_tracks: Vec<MediaTrack>,
    pub peer: Option<Box<dyn PeerConnection>>,
    /// Events of the live peer connection only.
    pub peer_events: Option<Receiver<PeerEvent>>,
    pub offer_sent_at: Option<Instant>,
}

impl ConnectionState {
    pub fn new(local_id: impl Into<ParticipantId>) -> Self {
        Self {
            local_id: local_id.into(),
            peer_id: None,
            phase: CallPhase::Idle,
            pending_offer: None,
            local_media: None,
            remote_tracks: Vec::new(),
            peer: None,
            peer_events: None,
            offer_sent_at: None,
        }
    }

    /// True when `id` is the party of the current call.
    pub fn is_peer(&self, id: &str) -> bool {
        self.peer_id.as_deref() == Some(id)
    }

    /// Close the peer connection, stop local media and forget the call.
    /// The local identity survives.
    pub fn reset(&mut self) {
        if let Some(mut peer) = self.peer.take() {
            peer.close();
        }
        if let Some(mut media) = self.local_media.take() {
            media.stop();
        }
        self.peer_events = None;
        self.peer_id = None;
        self.phase = CallPhase::Idle;
        self.pending_offer = None;
        self.remote_tracks.clear();
        self.offer_sent_at = None;
    }
}
