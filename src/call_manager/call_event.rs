use crate::call_manager::media::MediaTrack;
use crate::signaling::protocol::ParticipantId;

/// Why a call (or call attempt) ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndReason {
    /// Local hang-up or cancel.
    LocalHangup,
    /// The peer sent a termination notice.
    RemoteHangup,
    /// The callee said no (seen on both sides).
    Declined,
    /// No answer within the offer timeout.
    Timeout,
    /// The relay link went away.
    SignalingLost,
    Failed(String),
}

/// Notifications for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallEvent {
    IncomingCall { caller_id: ParticipantId },
    Calling { callee_id: ParticipantId },
    Connected { peer_id: ParticipantId },
    RemoteTrack(MediaTrack),
    Ended { reason: EndReason },
    Error(String),
}
