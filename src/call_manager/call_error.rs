use std::fmt;

use crate::call_manager::call_phase::CallPhase;
use crate::call_manager::media::MediaError;
use crate::call_manager::peer_connection::PeerConnectionError;
use crate::signaling_client::signaling_client_error::SignalingClientError;

#[derive(Debug)]
pub enum CallError {
    /// Empty receiver, or calling oneself.
    InvalidReceiver,
    /// Operation not allowed in the current phase.
    InvalidState {
        op: &'static str,
        phase: CallPhase,
    },
    Media(MediaError),
    PeerConnection(PeerConnectionError),
    /// The remote description was missing or of the wrong type.
    InvalidDescription,
    Signaling(SignalingClientError),
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallError::InvalidReceiver => write!(f, "invalid receiver id"),
            CallError::InvalidState { op, phase } => write!(f, "cannot {op} while {phase}"),
            CallError::Media(e) => write!(f, "{e}"),
            CallError::PeerConnection(e) => write!(f, "{e}"),
            CallError::InvalidDescription => write!(f, "missing or invalid session description"),
            CallError::Signaling(e) => write!(f, "signaling: {e}"),
        }
    }
}

impl std::error::Error for CallError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CallError::Media(e) => Some(e),
            CallError::PeerConnection(e) => Some(e),
            CallError::Signaling(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MediaError> for CallError {
    fn from(e: MediaError) -> Self {
        CallError::Media(e)
    }
}

impl From<PeerConnectionError> for CallError {
    fn from(e: PeerConnectionError) -> Self {
        CallError::PeerConnection(e)
    }
}

impl From<SignalingClientError> for CallError {
    fn from(e: SignalingClientError) -> Self {
        CallError::Signaling(e)
    }
}
