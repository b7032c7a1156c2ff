use std::fmt;
use std::sync::mpsc::Sender;

use crate::call_manager::media::MediaTrack;
use crate::signaling::protocol::{IceCandidate, SessionDescription};

/// Settings handed to every new peer connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtcConfiguration {
    /// STUN/TURN urls, e.g. `stun:stun.l.google.com:19302`.
    pub ice_servers: Vec<String>,
}

/// Asynchronous notifications from a peer connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerEvent {
    /// A candidate gathered locally that the remote side needs.
    LocalCandidate(IceCandidate),
    /// Media arriving from the remote side.
    RemoteTrack(MediaTrack),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerConnectionError {
    Create(String),
    Negotiation(String),
    InvalidDescription(String),
    Candidate(String),
    Closed,
}

impl fmt::Display for PeerConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create(msg) => write!(f, "cannot create peer connection: {msg}"),
            Self::Negotiation(msg) => write!(f, "negotiation failed: {msg}"),
            Self::InvalidDescription(msg) => write!(f, "invalid session description: {msg}"),
            Self::Candidate(msg) => write!(f, "candidate rejected: {msg}"),
            Self::Closed => write!(f, "peer connection is closed"),
        }
    }
}

impl std::error::Error for PeerConnectionError {}

/// The peer-connection primitive the call manager drives.
pub trait PeerConnection: Send {
    fn add_track(&mut self, track: &MediaTrack) -> Result<(), PeerConnectionError>;
    fn create_offer(&mut self) -> Result<SessionDescription, PeerConnectionError>;
    fn create_answer(&mut self) -> Result<SessionDescription, PeerConnectionError>;
    fn set_local_description(&mut self, desc: &SessionDescription) -> Result<(), PeerConnectionError>;
    fn set_remote_description(&mut self, desc: &SessionDescription) -> Result<(), PeerConnectionError>;
    fn add_ice_candidate(&mut self, candidate: &IceCandidate) -> Result<(), PeerConnectionError>;
    fn close(&mut self);
}

/// Creates peer connections. Each connection reports its events on the
/// sender it was created with.
pub trait PeerConnectionFactory: Send {
    fn create(
        &mut self,
        config: &RtcConfiguration,
        events: Sender<PeerEvent>,
    ) -> Result<Box<dyn PeerConnection>, PeerConnectionError>;
}
