use std::collections::HashMap;
use std::sync::Arc;

use crate::log::NoopLogSink;
use crate::log::log_sink::LogSink;
use crate::signaling::protocol::SignalingMsg;
use crate::signaling::registry::RegistrationStore;
use crate::signaling::server_engine::ServerEngine;
use crate::signaling::types::{ClientId, OutgoingMsg};

/// Router glues the ServerEngine to per-client outboxes.
pub struct Router {
    engine: ServerEngine,
    outboxes: HashMap<ClientId, Vec<SignalingMsg>>,
}

impl Router {
    pub fn new() -> Self {
        Self::with_log(Arc::new(NoopLogSink))
    }

    pub fn with_log(log: Arc<dyn LogSink>) -> Self {
        Self::with_engine(ServerEngine::with_log(log))
    }

    /// Router over an engine backed by a custom registration store.
    pub fn with_log_and_store(log: Arc<dyn LogSink>, store: Box<dyn RegistrationStore>) -> Self {
        Self::with_engine(ServerEngine::with_log_and_store(log, store))
    }

    pub fn with_engine(engine: ServerEngine) -> Self {
        Self {
            engine,
            outboxes: HashMap::new(),
        }
    }

    /// Make sure a connection has an outbox.
    pub fn register_client(&mut self, client_id: ClientId) {
        self.outboxes.entry(client_id).or_default();
    }

    /// Drop a connection's outbox and its registrations.
    pub fn unregister_client(&mut self, client_id: ClientId) {
        self.outboxes.remove(&client_id);
        self.engine.handle_disconnect(client_id);
    }

    /// Handle a message coming *from* a client and queue whatever it produces.
    pub fn handle_from_client(&mut self, from_cid: ClientId, msg: SignalingMsg) {
        let out_msgs = self.engine.handle(from_cid, msg);
        for out_msg in out_msgs {
            self.enqueue(out_msg);
        }
    }

    /// Drain and return all outgoing messages for a given client.
    pub fn take_outgoing_for(&mut self, client_id: ClientId) -> Vec<SignalingMsg> {
        self.outboxes
            .get_mut(&client_id)
            .map(std::mem::take)
            .unwrap_or_default()
    }

    /// Drain all pending outgoing messages for all clients as
    /// `(client_id_target, msg)` pairs.
    pub fn drain_all_outgoing(&mut self) -> Vec<(ClientId, SignalingMsg)> {
        let mut result = Vec::new();
        for (cid, msgs) in self.outboxes.iter_mut() {
            result.extend(msgs.drain(..).map(|m| (*cid, m)));
        }
        result
    }

    pub fn engine(&self) -> &ServerEngine {
        &self.engine
    }

    fn enqueue(&mut self, out_msg: OutgoingMsg) {
        // Only live connections have outboxes; anything else is stale.
        if let Some(queue) = self.outboxes.get_mut(&out_msg.client_id_target) {
            queue.push(out_msg.msg);
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}
