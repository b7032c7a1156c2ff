use std::io::{self, Read, Write};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

use crate::log::log_sink::LogSink;
use crate::signaling::protocol::{FrameError, FrameReader, SignalingMsg, write_msg};
use crate::signaling::server_event::ServerEvent;
use crate::signaling::types::ClientId;
use crate::{sink_debug, sink_info, sink_warn};

/// How long a connection thread blocks on the socket before checking its
/// outbound queue.
pub const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Thin wrapper over a stream with a read timeout that speaks in `SignalingMsg`.
///
/// Works for both plain TCP and rustls `StreamOwned`, which cannot be split
/// into independent read and write halves.
pub struct Connection<S> {
    pub client_id: ClientId,
    stream: S,
    reader: FrameReader,
}

impl<S> Connection<S>
where
    S: Read + Write,
{
    pub fn new(id: ClientId, stream: S) -> Self {
        Self {
            client_id: id,
            stream,
            reader: FrameReader::default(),
        }
    }

    /// Next complete message, or `Ok(None)` if the read timed out first.
    pub fn poll_recv(&mut self) -> Result<Option<SignalingMsg>, FrameError> {
        self.reader.poll(&mut self.stream)
    }

    pub fn send(&mut self, msg: &SignalingMsg) -> Result<(), FrameError> {
        write_msg(&mut self.stream, msg)
    }
}

/// Spawn the I/O thread for a single accepted client.
///
/// The stream must already have a short read timeout (see [`POLL_INTERVAL`]).
/// `server_tx` is the Sender<ServerEvent> that talks to the central relay loop.
pub fn spawn_connection_thread<S>(
    client_id: ClientId,
    stream: S,
    server_tx: Sender<ServerEvent>,
    log: Arc<dyn LogSink>,
) -> io::Result<()>
where
    S: Read + Write + Send + 'static,
{
    let (to_client_tx, to_client_rx) = mpsc::channel::<SignalingMsg>();

    server_tx
        .send(ServerEvent::RegisterClient {
            client_id,
            to_client: to_client_tx,
        })
        .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "relay loop is gone"))?;

    thread::Builder::new()
        .name(format!("relay-conn-{client_id}"))
        .spawn(move || {
            let conn = Connection::new(client_id, stream);
            serve_connection(conn, &to_client_rx, &server_tx, log.as_ref());
            let _ = server_tx.send(ServerEvent::Disconnected { client_id });
        })?;

    Ok(())
}

/// Pump one connection until it closes or errors.
fn serve_connection<S: Read + Write>(
    mut conn: Connection<S>,
    to_client_rx: &Receiver<SignalingMsg>,
    server_tx: &Sender<ServerEvent>,
    log: &dyn LogSink,
) {
    let client_id = conn.client_id;
    loop {
        // socket -> relay loop
        match conn.poll_recv() {
            Ok(Some(msg)) => {
                if server_tx
                    .send(ServerEvent::MsgFromClient { client_id, msg })
                    .is_err()
                {
                    return;
                }
                // Drain whatever else is already buffered before writing.
                continue;
            }
            Ok(None) => {}
            Err(FrameError::Io(e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
                sink_info!(log, "[conn {}] peer closed connection", client_id);
                return;
            }
            Err(FrameError::Io(e)) => {
                sink_warn!(
                    log,
                    "[conn {}] IO error in reader: {} (kind={:?})",
                    client_id,
                    e,
                    e.kind()
                );
                return;
            }
            Err(FrameError::Proto(e)) => {
                // A bad frame desynchronizes the stream; give up on it.
                sink_warn!(log, "[conn {}] protocol error: {}", client_id, e);
                return;
            }
        }

        // relay loop -> socket
        loop {
            match to_client_rx.try_recv() {
                Ok(msg) => {
                    if let Err(e) = conn.send(&msg) {
                        sink_warn!(log, "[conn {}] error sending {}: {}", client_id, msg.name(), e);
                        return;
                    }
                    sink_debug!(log, "[conn {}] sent {}", client_id, msg.name());
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use crate::log::NoopLogSink;
    use crate::signaling::protocol::read_msg;
    use std::net::{TcpListener, TcpStream};

    #[test]
    fn connection_forwards_frames_both_ways() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let mut client = TcpStream::connect(addr).unwrap();
        let (server_side, _) = listener.accept().unwrap();
        server_side.set_read_timeout(Some(POLL_INTERVAL)).unwrap();

        let (ev_tx, ev_rx) = mpsc::channel::<ServerEvent>();
        spawn_connection_thread(7, server_side, ev_tx, Arc::new(NoopLogSink)).unwrap();

        let to_client = match ev_rx.recv_timeout(Duration::from_secs(1)).unwrap() {
            ServerEvent::RegisterClient {
                client_id,
                to_client,
            } => {
                assert_eq!(client_id, 7);
                to_client
            }
            _ => panic!("expected RegisterClient first"),
        };

        write_msg(
            &mut client,
            &SignalingMsg::Register {
                identity: "u1".into(),
            },
        )
        .unwrap();
        match ev_rx.recv_timeout(Duration::from_secs(1)).unwrap() {
            ServerEvent::MsgFromClient { client_id, msg } => {
                assert_eq!(client_id, 7);
                assert_eq!(
                    msg,
                    SignalingMsg::Register {
                        identity: "u1".into()
                    }
                );
            }
            _ => panic!("expected MsgFromClient"),
        }

        to_client.send(SignalingMsg::Pong { nonce: 5 }).unwrap();
        client
            .set_read_timeout(Some(Duration::from_secs(1)))
            .unwrap();
        assert_eq!(read_msg(&mut client).unwrap(), SignalingMsg::Pong { nonce: 5 });

        drop(client);
        let mut saw_disconnect = false;
        while let Ok(ev) = ev_rx.recv_timeout(Duration::from_secs(1)) {
            if let ServerEvent::Disconnected { client_id } = ev {
                assert_eq!(client_id, 7);
                saw_disconnect = true;
                break;
            }
        }
        assert!(saw_disconnect);
    }
}
