use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rustls::pki_types::ServerName;
use rustls::{ClientConfig, ClientConnection, StreamOwned};

use crate::config::Config;
use crate::log::log_sink::LogSink;
use crate::signaling::protocol::{
    Envelope, FrameError, FrameReader, ParticipantId, SignalingMsg, write_msg,
};
use crate::signaling::tls::build_relay_client_config;
use crate::signaling::transport::POLL_INTERVAL;
use crate::signaling_client::signaling_client_error::SignalingClientError;
use crate::signaling_client::signaling_command::SignalingCommand;
use crate::signaling_client::signaling_event::SignalingEvent;
use crate::signaling_client::signaling_sender::SignalingSender;
use crate::tls_utils::{relay_ca_path, relay_domain};
use crate::{sink_debug, sink_info, sink_warn};

pub const DEFAULT_RELAY_ADDR: &str = "127.0.0.1:8080";

/// A registered link to the relay.
///
/// The connection announces `identity` before anything else, then a
/// background thread owns the socket: it forwards routed envelopes to the
/// application as [`SignalingEvent`]s and writes whatever is queued with
/// [`SignalingClient::send`].
pub struct SignalingClient {
    identity: ParticipantId,
    sender: SignalingSender,
    cmd_tx: Sender<SignalingCommand>,
    events_rx: Receiver<SignalingEvent>,
    handle: Option<JoinHandle<()>>,
}

impl SignalingClient {
    /// Connect over plain TCP and register as `identity`.
    pub fn connect(
        addr: &str,
        identity: impl Into<ParticipantId>,
        log: Arc<dyn LogSink>,
    ) -> Result<Self, SignalingClientError> {
        let identity = identity.into();
        let mut stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;

        register(&mut stream, &identity)?;
        stream.set_read_timeout(Some(POLL_INTERVAL))?;

        sink_info!(log, "[signaling] connected to {} as {}", addr, identity);
        Self::start(stream, identity, log)
    }

    /// Connect over TLS, verifying the relay certificate against `tls_config`
    /// for `domain`, and register as `identity`.
    pub fn connect_tls(
        addr: &str,
        domain: &str,
        tls_config: Arc<ClientConfig>,
        identity: impl Into<ParticipantId>,
        log: Arc<dyn LogSink>,
    ) -> Result<Self, SignalingClientError> {
        let identity = identity.into();
        let server_name = ServerName::try_from(domain.to_string()).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid relay domain {domain}: {e}"),
            )
        })?;
        let conn = ClientConnection::new(tls_config, server_name)
            .map_err(|e| io::Error::other(format!("TLS setup failed: {e}")))?;

        let tcp = TcpStream::connect(addr)?;
        tcp.set_nodelay(true)?;
        let mut stream = StreamOwned::new(conn, tcp);

        // Blocking until the handshake completes with the first write.
        register(&mut stream, &identity)?;
        stream.sock.set_read_timeout(Some(POLL_INTERVAL))?;

        sink_info!(log, "[signaling] TLS connection to {} ({}) as {}", addr, domain, identity);
        Self::start(stream, identity, log)
    }

    /// Connect as described by the `[Client]` section (`relay_addr`), using
    /// TLS when `[Relay] use_tls` is set.
    pub fn connect_with_config(
        config: &Config,
        identity: impl Into<ParticipantId>,
        log: Arc<dyn LogSink>,
    ) -> Result<Self, SignalingClientError> {
        let addr = config.get_non_empty_or_default("Client", "relay_addr", DEFAULT_RELAY_ADDR);
        if config.get_bool_or("Relay", "use_tls", false) {
            let tls_config = build_relay_client_config(relay_ca_path(config))?;
            Self::connect_tls(addr, relay_domain(config), tls_config, identity, log)
        } else {
            Self::connect(addr, identity, log)
        }
    }

    fn start<S>(
        stream: S,
        identity: ParticipantId,
        log: Arc<dyn LogSink>,
    ) -> Result<Self, SignalingClientError>
    where
        S: Read + Write + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel::<SignalingCommand>();
        let (events_tx, events_rx) = mpsc::channel::<SignalingEvent>();

        let handle = thread::Builder::new()
            .name(format!("signaling-{identity}"))
            .spawn(move || {
                let reason = network_loop(stream, &cmd_rx, &events_tx, log.as_ref());
                sink_info!(log, "[signaling] network thread exiting: {}", reason);
                let _ = events_tx.send(SignalingEvent::Disconnected { reason });
            })?;

        Ok(Self {
            identity,
            sender: SignalingSender::new(cmd_tx.clone()),
            cmd_tx,
            events_rx,
            handle: Some(handle),
        })
    }

    /// Identity this connection registered.
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Queue a message for the relay.
    pub fn send(&self, msg: SignalingMsg) -> Result<(), SignalingClientError> {
        self.sender.send(msg)
    }

    pub fn send_envelope(&self, env: Envelope) -> Result<(), SignalingClientError> {
        self.sender.send_envelope(env)
    }

    /// Outbound handle that can be handed to a call manager.
    pub fn sender(&self) -> SignalingSender {
        self.sender.clone()
    }

    /// Send a keepalive; the relay answers with `Pong` carrying the same nonce.
    pub fn ping(&self) -> Result<u64, SignalingClientError> {
        let nonce = rand::random::<u64>();
        self.send(SignalingMsg::Ping { nonce })?;
        Ok(nonce)
    }

    /// Non-blocking poll for the next event.
    pub fn try_recv(&self) -> Option<SignalingEvent> {
        match self.events_rx.try_recv() {
            Ok(ev) => Some(ev),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Wait up to `timeout` for the next event.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<SignalingEvent> {
        match self.events_rx.recv_timeout(timeout) {
            Ok(ev) => Some(ev),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Close the link and wait for the network thread. Idempotent.
    pub fn disconnect(&mut self) {
        let _ = self.cmd_tx.send(SignalingCommand::Disconnect);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for SignalingClient {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn register<W: Write>(stream: &mut W, identity: &str) -> Result<(), FrameError> {
    write_msg(
        stream,
        &SignalingMsg::Register {
            identity: identity.to_owned(),
        },
    )
}

/// Owns the socket until the link breaks or a disconnect is requested.
/// Returns a human-readable reason.
fn network_loop<S: Read + Write>(
    mut stream: S,
    cmd_rx: &Receiver<SignalingCommand>,
    events_tx: &Sender<SignalingEvent>,
    log: &dyn LogSink,
) -> String {
    let mut reader = FrameReader::default();

    loop {
        // relay -> application
        match reader.poll(&mut stream) {
            Ok(Some(msg)) => {
                let ev = match msg {
                    SignalingMsg::Envelope(env) => SignalingEvent::Envelope(env),
                    SignalingMsg::Pong { nonce } => SignalingEvent::Pong { nonce },
                    other => {
                        sink_warn!(log, "[signaling] ignoring unexpected {} from relay", other.name());
                        continue;
                    }
                };
                if events_tx.send(ev).is_err() {
                    return "application dropped the event receiver".into();
                }
                continue;
            }
            Ok(None) => {}
            Err(FrameError::Io(e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
                return "relay closed the connection".into();
            }
            Err(e) => return format!("read failed: {e}"),
        }

        // application -> relay
        loop {
            match cmd_rx.try_recv() {
                Ok(SignalingCommand::Send(msg)) => match write_msg(&mut stream, &msg) {
                    Ok(()) => sink_debug!(log, "[signaling] sent {}", msg.name()),
                    // Nothing was written; the link is still usable.
                    Err(FrameError::Proto(e)) => {
                        sink_warn!(log, "[signaling] dropping {}: {}", msg.name(), e);
                    }
                    Err(e) => return format!("sending {} failed: {e}", msg.name()),
                },
                Ok(SignalingCommand::Disconnect) | Err(TryRecvError::Disconnected) => {
                    return "disconnect requested".into();
                }
                Err(TryRecvError::Empty) => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::log::NoopLogSink;
    use crate::signaling::protocol::{MAX_BODY_LEN, SessionDescription, read_msg};
    use std::net::TcpListener;

    #[test]
    fn connect_registers_before_anything_else() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let client = SignalingClient::connect(&addr, "u1", Arc::new(NoopLogSink)).unwrap();
        let (mut relay_side, _) = listener.accept().unwrap();
        relay_side
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();

        assert_eq!(
            read_msg(&mut relay_side).unwrap(),
            SignalingMsg::Register {
                identity: "u1".into()
            }
        );

        let nonce = client.ping().unwrap();
        assert_eq!(read_msg(&mut relay_side).unwrap(), SignalingMsg::Ping { nonce });

        write_msg(&mut relay_side, &SignalingMsg::Pong { nonce }).unwrap();
        assert_eq!(
            client.recv_timeout(Duration::from_secs(2)),
            Some(SignalingEvent::Pong { nonce })
        );
        assert_eq!(client.identity(), "u1");
    }

    #[test]
    fn relay_closing_the_socket_surfaces_as_disconnected() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let client = SignalingClient::connect(&addr, "s1", Arc::new(NoopLogSink)).unwrap();
        let (relay_side, _) = listener.accept().unwrap();
        drop(relay_side);

        match client.recv_timeout(Duration::from_secs(2)) {
            Some(SignalingEvent::Disconnected { .. }) => {}
            other => panic!("expected Disconnected, got {other:?}"),
        }
        // Once the thread is gone, sends fail.
        let mut failed = false;
        for _ in 0..50 {
            if client.send(SignalingMsg::Ping { nonce: 1 }).is_err() {
                failed = true;
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        assert!(failed);
    }

    #[test]
    fn oversized_envelope_is_dropped_and_link_stays_up() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        let client = SignalingClient::connect(&addr, "u1", Arc::new(NoopLogSink)).unwrap();
        let (mut relay_side, _) = listener.accept().unwrap();
        relay_side
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        read_msg(&mut relay_side).unwrap();

        client
            .send_envelope(Envelope::Offer {
                sender_id: "u1".into(),
                receiver_id: "s1".into(),
                offer: SessionDescription::offer("a".repeat(MAX_BODY_LEN)),
            })
            .unwrap();
        let nonce = client.ping().unwrap();

        // The ping is the next thing on the wire.
        assert_eq!(read_msg(&mut relay_side).unwrap(), SignalingMsg::Ping { nonce });
    }

    #[test]
    fn config_selects_relay_address() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let config = Config::parse(&format!("[Client]\nrelay_addr = {addr}\n"));

        let client =
            SignalingClient::connect_with_config(&config, "s1", Arc::new(NoopLogSink)).unwrap();
        let (mut relay_side, _) = listener.accept().unwrap();
        relay_side
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        assert_eq!(
            read_msg(&mut relay_side).unwrap(),
            SignalingMsg::Register {
                identity: "s1".into()
            }
        );
        drop(client);
    }

    #[test]
    fn tls_config_without_ca_fails_before_connecting() {
        let config = Config::parse(
            "[Relay]\nuse_tls = true\n[TLS]\nrelay_ca = /nonexistent/rootCA.pem\n",
        );
        let err = SignalingClient::connect_with_config(&config, "u1", Arc::new(NoopLogSink));
        assert!(matches!(err, Err(SignalingClientError::Io(_))));
    }

    #[test]
    fn connect_to_closed_port_fails() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);

        let err = SignalingClient::connect(&addr, "u1", Arc::new(NoopLogSink));
        assert!(matches!(err, Err(SignalingClientError::Io(_))));
    }
}
