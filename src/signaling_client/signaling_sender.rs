use std::sync::mpsc::Sender;

use crate::signaling::protocol::{Envelope, SignalingMsg};
use crate::signaling_client::signaling_client_error::SignalingClientError;
use crate::signaling_client::signaling_command::SignalingCommand;

/// Cloneable outbound handle to a [`super::SignalingClient`].
///
/// Lets the call manager send while the owner of the client keeps reading
/// events.
#[derive(Clone, Debug)]
pub struct SignalingSender {
    cmd_tx: Sender<SignalingCommand>,
}

impl SignalingSender {
    pub(crate) fn new(cmd_tx: Sender<SignalingCommand>) -> Self {
        Self { cmd_tx }
    }

    /// Queue a message for the relay.
    pub fn send(&self, msg: SignalingMsg) -> Result<(), SignalingClientError> {
        self.cmd_tx
            .send(SignalingCommand::Send(msg))
            .map_err(|_| SignalingClientError::Disconnected)
    }

    pub fn send_envelope(&self, env: Envelope) -> Result<(), SignalingClientError> {
        self.send(SignalingMsg::Envelope(env))
    }
}
