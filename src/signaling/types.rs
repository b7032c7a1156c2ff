use crate::signaling::protocol::SignalingMsg;

/// Relay-internal handle for one accepted connection.
pub type ClientId = u64;

/// A message the server wants to send to a client.
#[derive(Debug, PartialEq, Eq)]
pub struct OutgoingMsg {
    pub client_id_target: ClientId,
    pub msg: SignalingMsg,
}
