use crate::signaling::protocol::SignalingMsg;

/// Commands issued by the application into the signaling client's network thread.
#[derive(Debug)]
pub enum SignalingCommand {
    Send(SignalingMsg),
    Disconnect,
}
