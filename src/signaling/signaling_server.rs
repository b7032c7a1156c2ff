use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::{io, thread};

use rustls::{ServerConfig, ServerConnection, StreamOwned};

use crate::log::NoopLogSink;
use crate::log::log_sink::LogSink;
use crate::signaling::registry::{InMemoryRegistrationStore, RegistrationStore};
use crate::signaling::router::Router;
use crate::signaling::runtime::run_server_loop;
use crate::signaling::server_event::ServerEvent;
use crate::signaling::transport::{POLL_INTERVAL, spawn_connection_thread};
use crate::signaling::types::ClientId;
use crate::{sink_info, sink_warn};

/// Top-level runtime object for the relay.
///
/// This owns:
/// - the bound listener
/// - logging sink
/// - registration store
/// - optional TLS config
///
/// and knows how to spin up the central Router loop plus per-connection threads.
pub struct SignalingServer {
    listener: TcpListener,
    log: Arc<dyn LogSink>,
    store: Box<dyn RegistrationStore>,
    tls: Option<Arc<ServerConfig>>,
}

impl SignalingServer {
    /// Bind a plaintext relay on `addr` with the in-memory registration table.
    pub fn bind(addr: &str, log: Arc<dyn LogSink>) -> io::Result<Self> {
        Ok(Self {
            listener: TcpListener::bind(addr)?,
            log,
            store: Box::new(InMemoryRegistrationStore::new()),
            tls: None,
        })
    }

    /// Convenience: plaintext relay with no logging (tests).
    pub fn bind_no_log(addr: &str) -> io::Result<Self> {
        Self::bind(addr, Arc::new(NoopLogSink))
    }

    /// Terminate TLS on every accepted connection.
    pub fn with_tls(mut self, tls: Arc<ServerConfig>) -> Self {
        self.tls = Some(tls);
        self
    }

    /// Replace the registration store.
    pub fn with_store(mut self, store: Box<dyn RegistrationStore>) -> Self {
        self.store = store;
        self
    }

    /// Address actually bound (useful with port 0).
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Blocking main loop: spawn the central relay loop, then accept clients forever.
    pub fn run(self) -> io::Result<()> {
        let Self {
            listener,
            log,
            store,
            tls,
        } = self;

        // Events from all connections -> central relay loop
        let (server_tx, server_rx) = mpsc::channel::<ServerEvent>();

        {
            let log_for_loop = log.clone();
            let log_for_router = log.clone();

            thread::Builder::new()
                .name("relay-loop".into())
                .spawn(move || {
                    sink_info!(log_for_loop, "[relay] server loop started");
                    let router = Router::with_log_and_store(log_for_router, store);
                    run_server_loop(router, log_for_loop, server_rx);
                })?;
        }

        let mut next_client_id: ClientId = 1;
        sink_info!(
            log,
            "relay listening on {} ({})",
            listener.local_addr()?,
            if tls.is_some() { "TLS" } else { "plaintext" }
        );

        for stream in listener.incoming() {
            let stream = match stream {
                Ok(s) => s,
                Err(e) => {
                    sink_warn!(log, "incoming TCP accept failed: {:?} (continuing to accept)", e);
                    continue;
                }
            };

            let client_id = next_client_id;
            next_client_id += 1;

            sink_info!(
                log,
                "accepted connection from {} as client_id={}",
                stream
                    .peer_addr()
                    .map(|a| a.to_string())
                    .unwrap_or_else(|_| "?".into()),
                client_id
            );

            if let Err(e) = accept_client(client_id, stream, tls.as_ref(), &server_tx, &log) {
                sink_warn!(log, "failed to set up client {}: {:?}", client_id, e);
            }
        }

        Ok(())
    }
}

fn accept_client(
    client_id: ClientId,
    stream: TcpStream,
    tls: Option<&Arc<ServerConfig>>,
    server_tx: &Sender<ServerEvent>,
    log: &Arc<dyn LogSink>,
) -> io::Result<()> {
    stream.set_nodelay(true)?;
    stream.set_read_timeout(Some(POLL_INTERVAL))?;

    match tls {
        Some(config) => {
            let conn = ServerConnection::new(config.clone())
                .map_err(|e| io::Error::other(format!("TLS session setup failed: {e}")))?;
            // Handshake is driven lazily by the first reads on the connection thread.
            let tls_stream = StreamOwned::new(conn, stream);
            spawn_connection_thread(client_id, tls_stream, server_tx.clone(), log.clone())
        }
        None => spawn_connection_thread(client_id, stream, server_tx.clone(), log.clone()),
    }
}
