use std::sync::mpsc::Sender;

use crate::signaling::protocol::Envelope;
use crate::signaling_client::SignalingSender;
use crate::signaling_client::signaling_client_error::SignalingClientError;

/// Outbound half of the relay link, as seen by the call manager.
pub trait EnvelopeSink: Send {
    fn send_envelope(&self, env: Envelope) -> Result<(), SignalingClientError>;
}

impl EnvelopeSink for SignalingSender {
    fn send_envelope(&self, env: Envelope) -> Result<(), SignalingClientError> {
        SignalingSender::send_envelope(self, env)
    }
}

/// In-process link, handy for wiring two call managers without a relay.
impl EnvelopeSink for Sender<Envelope> {
    fn send_envelope(&self, env: Envelope) -> Result<(), SignalingClientError> {
        self.send(env).map_err(|_| SignalingClientError::Disconnected)
    }
}
