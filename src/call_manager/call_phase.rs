use std::fmt;

/// Negotiation phase of the single call a client can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CallPhase {
    #[default]
    Idle,
    /// Offer sent, waiting for the answer.
    Calling,
    /// Offer received, waiting for the local user.
    RingingIncoming,
    Connected,
}

impl fmt::Display for CallPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CallPhase::Idle => "idle",
            CallPhase::Calling => "calling",
            CallPhase::RingingIncoming => "ringing",
            CallPhase::Connected => "connected",
        };
        f.write_str(s)
    }
}
