use crate::signaling::protocol::Envelope;

/// What the network thread hands back to the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalingEvent {
    /// An envelope the relay routed to us.
    Envelope(Envelope),
    /// Reply to one of our pings.
    Pong { nonce: u64 },
    /// The relay link is gone; no further events will follow.
    Disconnected { reason: String },
}
