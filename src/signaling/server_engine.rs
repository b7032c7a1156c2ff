use std::sync::Arc;

use crate::log::NoopLogSink;
use crate::log::log_sink::LogSink;
use crate::signaling::protocol::{Envelope, ParticipantId, SignalingMsg};
use crate::signaling::registry::{InMemoryRegistrationStore, RegistrationStore};
use crate::signaling::types::{ClientId, OutgoingMsg};
use crate::{sink_debug, sink_info, sink_trace, sink_warn};

/// Relay state machine: identity registration and envelope routing.
///
/// Pure logic, no I/O. Every call returns the messages to deliver, which
/// keeps it trivially testable and lets the runtime own the sockets.
pub struct ServerEngine {
    registry: Box<dyn RegistrationStore>,
    log: Arc<dyn LogSink>,
}

impl ServerEngine {
    pub fn new() -> Self {
        Self::with_log_and_store(Arc::new(NoopLogSink), Box::new(InMemoryRegistrationStore::new()))
    }

    /// Engine with a custom logger and the in-memory registration table.
    pub fn with_log(log: Arc<dyn LogSink>) -> Self {
        Self::with_log_and_store(log, Box::new(InMemoryRegistrationStore::new()))
    }

    /// Engine with a custom registration store, but Noop logging.
    pub fn with_store(registry: Box<dyn RegistrationStore>) -> Self {
        Self::with_log_and_store(Arc::new(NoopLogSink), registry)
    }

    /// Fully explicit constructor.
    pub fn with_log_and_store(log: Arc<dyn LogSink>, registry: Box<dyn RegistrationStore>) -> Self {
        Self { registry, log }
    }

    /// Read-only view of the Registration Table.
    pub fn registry(&self) -> &dyn RegistrationStore {
        self.registry.as_ref()
    }

    /// Main entrypoint: handle a message from a client.
    ///
    /// Returns a list of (target_client, msg) to send.
    pub fn handle(&mut self, from_cid: ClientId, msg: SignalingMsg) -> Vec<OutgoingMsg> {
        match msg {
            SignalingMsg::Register { identity } => {
                self.handle_register(from_cid, identity);
                Vec::new()
            }

            SignalingMsg::Envelope(env) => self.route(from_cid, env),

            SignalingMsg::Ping { nonce } => {
                sink_trace!(self.log, "client {} ping {}", from_cid, nonce);
                vec![OutgoingMsg {
                    client_id_target: from_cid,
                    msg: SignalingMsg::Pong { nonce },
                }]
            }

            SignalingMsg::Pong { .. } => {
                sink_warn!(self.log, "ignoring server-only pong from client {}", from_cid);
                Vec::new()
            }
        }
    }

    /// Called when a connection closes: drop every identity bound to it.
    ///
    /// Peers are not notified; an in-progress call simply stops receiving
    /// envelopes from this side.
    pub fn handle_disconnect(&mut self, client: ClientId) -> Vec<ParticipantId> {
        let removed = self.registry.unbind_client(client);
        if removed.is_empty() {
            sink_debug!(self.log, "client {} disconnected (never registered)", client);
        } else {
            sink_info!(
                self.log,
                "client {} disconnected; unregistered {:?} ({} identities remain)",
                client,
                removed,
                self.registry.len()
            );
        }
        removed
    }

    // ---- Individual handlers ---------------------------------------------

    fn handle_register(&mut self, client: ClientId, identity: ParticipantId) {
        if identity.is_empty() {
            sink_warn!(self.log, "client {} tried to register an empty identity", client);
            return;
        }

        match self.registry.bind(identity.clone(), client) {
            Some(previous) => sink_info!(
                self.log,
                "identity {} re-registered on client {} (replaces client {})",
                identity,
                client,
                previous
            ),
            None => sink_info!(
                self.log,
                "client {} registered as {} ({} identities online)",
                client,
                identity,
                self.registry.len()
            ),
        }
    }

    /// Forward an envelope verbatim to its receiver, or drop it silently if
    /// the receiver is not registered.
    fn route(&mut self, from: ClientId, env: Envelope) -> Vec<OutgoingMsg> {
        let Some(target_client) = self.registry.lookup(env.receiver_id()) else {
            sink_warn!(
                self.log,
                "dropping {} from client {} ({}): receiver {} is not registered",
                env.kind(),
                from,
                env.sender_id(),
                env.receiver_id()
            );
            return Vec::new();
        };

        sink_debug!(
            self.log,
            "forwarding {} from client {} ({}) to client {} ({})",
            env.kind(),
            from,
            env.sender_id(),
            target_client,
            env.receiver_id()
        );

        vec![OutgoingMsg {
            client_id_target: target_client,
            msg: SignalingMsg::Envelope(env),
        }]
    }
}

impl Default for ServerEngine {
    fn default() -> Self {
        Self::new()
    }
}
