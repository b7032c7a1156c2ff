use std::collections::HashMap;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};

use crate::log::log_sink::LogSink;
use crate::signaling::protocol::SignalingMsg;
use crate::signaling::router::Router;
use crate::signaling::server_event::ServerEvent;
use crate::signaling::types::ClientId;
use crate::{sink_debug, sink_info, sink_warn};

/// Central relay loop: owns the Router and maps client_id -> Sender<SignalingMsg>.
///
/// Every registration, lookup and disconnect goes through this one thread,
/// so the Registration Table never needs a lock.
pub fn run_server_loop(mut router: Router, log: Arc<dyn LogSink>, rx: Receiver<ServerEvent>) {
    use ServerEvent::*;

    let mut clients: HashMap<ClientId, Sender<SignalingMsg>> = HashMap::new();

    while let Ok(ev) = rx.recv() {
        match ev {
            RegisterClient {
                client_id,
                to_client,
            } => {
                router.register_client(client_id);
                clients.insert(client_id, to_client);

                sink_info!(
                    log,
                    "connection {} attached to relay loop (now {} connections)",
                    client_id,
                    clients.len()
                );
            }

            MsgFromClient { client_id, msg } => {
                sink_debug!(log, "{} from client {}", msg.name(), client_id);

                router.handle_from_client(client_id, msg);

                for (c_target_id, out_msg) in router.drain_all_outgoing() {
                    let name = out_msg.name();
                    match clients.get(&c_target_id) {
                        Some(tx) => {
                            if tx.send(out_msg).is_err() {
                                sink_warn!(
                                    log,
                                    "failed to deliver {} to client {} (channel closed)",
                                    name,
                                    c_target_id
                                );
                            }
                        }
                        None => {
                            sink_warn!(log, "no client {} to deliver {}", c_target_id, name);
                        }
                    }
                }
            }

            Disconnected { client_id } => {
                // Ignore reports for connections already dropped by the loop.
                if clients.remove(&client_id).is_some() {
                    sink_info!(log, "client {} disconnected (transport)", client_id);
                    router.unregister_client(client_id);
                }
            }
        }
    }

    sink_info!(
        log,
        "ServerEvent channel closed; relay loop shutting down ({} clients left)",
        clients.len()
    );
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    use crate::log::NoopLogSink;
    use crate::signaling::protocol::{Envelope, SessionDescription};

    fn attach(ev_tx: &Sender<ServerEvent>, client_id: ClientId) -> Receiver<SignalingMsg> {
        let (to_client_tx, to_client_rx) = mpsc::channel::<SignalingMsg>();
        ev_tx
            .send(ServerEvent::RegisterClient {
                client_id,
                to_client: to_client_tx,
            })
            .unwrap();
        to_client_rx
    }

    fn spawn_loop() -> Sender<ServerEvent> {
        let (ev_tx, ev_rx) = mpsc::channel::<ServerEvent>();
        let log = Arc::new(NoopLogSink);
        thread::spawn(move || run_server_loop(Router::new(), log, ev_rx));
        ev_tx
    }

    #[test]
    fn server_loop_routes_offer_to_registered_receiver() {
        let ev_tx = spawn_loop();
        let _caller_rx = attach(&ev_tx, 1);
        let callee_rx = attach(&ev_tx, 2);

        for (cid, identity) in [(1, "u1"), (2, "s1")] {
            ev_tx
                .send(ServerEvent::MsgFromClient {
                    client_id: cid,
                    msg: SignalingMsg::Register {
                        identity: identity.into(),
                    },
                })
                .unwrap();
        }

        let offer = SignalingMsg::Envelope(Envelope::Offer {
            sender_id: "u1".into(),
            receiver_id: "s1".into(),
            offer: SessionDescription::offer("v=0\r\n"),
        });
        ev_tx
            .send(ServerEvent::MsgFromClient {
                client_id: 1,
                msg: offer.clone(),
            })
            .unwrap();

        let got = callee_rx
            .recv_timeout(Duration::from_millis(500))
            .expect("expected the offer at s1");
        assert_eq!(got, offer);
    }

    #[test]
    fn disconnected_receiver_no_longer_gets_envelopes() {
        let ev_tx = spawn_loop();
        let a_rx = attach(&ev_tx, 1);
        let _c_rx = attach(&ev_tx, 3);

        ev_tx
            .send(ServerEvent::MsgFromClient {
                client_id: 1,
                msg: SignalingMsg::Register {
                    identity: "a".into(),
                },
            })
            .unwrap();
        ev_tx.send(ServerEvent::Disconnected { client_id: 1 }).unwrap();
        ev_tx
            .send(ServerEvent::MsgFromClient {
                client_id: 3,
                msg: SignalingMsg::Envelope(Envelope::Terminate {
                    sender_id: "c".into(),
                    receiver_id: "a".into(),
                }),
            })
            .unwrap();

        // Loop dropped a's sender on disconnect, so the channel closes empty.
        assert!(matches!(
            a_rx.recv_timeout(Duration::from_millis(500)),
            Err(mpsc::RecvTimeoutError::Disconnected)
        ));
    }
}
