use std::sync::mpsc::Sender;

use crate::signaling::{protocol::SignalingMsg, types::ClientId};

/// Events sent *to* the central server thread.
pub enum ServerEvent {
    /// A new connection is up, with its outgoing channel.
    RegisterClient {
        client_id: ClientId,
        to_client: Sender<SignalingMsg>,
    },

    /// A client sent a signaling message.
    MsgFromClient { client_id: ClientId, msg: SignalingMsg },

    /// A client disconnected (TCP/TLS closed or errored).
    Disconnected { client_id: ClientId },
}
