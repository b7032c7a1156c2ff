// ---- Public message enum --------------------------------------------------

use crate::signaling::protocol::{IceCandidate, MsgType, ParticipantId, SessionDescription};

/// The four routable signaling envelopes.
///
/// The relay forwards these verbatim to `receiver_id`; only the two call
/// parties interpret the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    Offer {
        sender_id: ParticipantId,
        receiver_id: ParticipantId,
        offer: SessionDescription,
    },
    Answer {
        sender_id: ParticipantId,
        receiver_id: ParticipantId,
        /// Absent when the call was declined.
        answer: Option<SessionDescription>,
        accepted: bool,
    },
    Candidate {
        sender_id: ParticipantId,
        receiver_id: ParticipantId,
        candidate: IceCandidate,
    },
    Terminate {
        sender_id: ParticipantId,
        receiver_id: ParticipantId,
    },
}

impl Envelope {
    pub fn sender_id(&self) -> &str {
        match self {
            Envelope::Offer { sender_id, .. }
            | Envelope::Answer { sender_id, .. }
            | Envelope::Candidate { sender_id, .. }
            | Envelope::Terminate { sender_id, .. } => sender_id,
        }
    }

    pub fn receiver_id(&self) -> &str {
        match self {
            Envelope::Offer { receiver_id, .. }
            | Envelope::Answer { receiver_id, .. }
            | Envelope::Candidate { receiver_id, .. }
            | Envelope::Terminate { receiver_id, .. } => receiver_id,
        }
    }

    pub fn msg_type(&self) -> MsgType {
        match self {
            Envelope::Offer { .. } => MsgType::Offer,
            Envelope::Answer { .. } => MsgType::Answer,
            Envelope::Candidate { .. } => MsgType::Candidate,
            Envelope::Terminate { .. } => MsgType::CallEnded,
        }
    }

    pub fn kind(&self) -> &'static str {
        self.msg_type().event_name()
    }
}

/// Everything that can travel over a relay link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalingMsg {
    /// Bind this connection to `identity` (client → relay).
    Register { identity: ParticipantId },

    /// Routed envelope (client → relay → client).
    Envelope(Envelope),

    // Keepalive
    Ping { nonce: u64 },
    Pong { nonce: u64 },
}

impl SignalingMsg {
    pub fn msg_type(&self) -> MsgType {
        match self {
            SignalingMsg::Register { .. } => MsgType::Register,
            SignalingMsg::Envelope(env) => env.msg_type(),
            SignalingMsg::Ping { .. } => MsgType::Ping,
            SignalingMsg::Pong { .. } => MsgType::Pong,
        }
    }

    /// Short name for logging; never includes SDP or candidate text.
    pub fn name(&self) -> &'static str {
        self.msg_type().event_name()
    }
}

impl From<Envelope> for SignalingMsg {
    fn from(env: Envelope) -> Self {
        SignalingMsg::Envelope(env)
    }
}
