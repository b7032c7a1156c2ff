use std::sync::Arc;
use std::sync::mpsc::{self, TryRecvError};
use std::time::Instant;

use crate::call_manager::call_config::CallConfig;
use crate::call_manager::call_error::CallError;
use crate::call_manager::call_event::{CallEvent, EndReason};
use crate::call_manager::call_phase::CallPhase;
use crate::call_manager::connection_state::ConnectionState;
use crate::call_manager::envelope_sink::EnvelopeSink;
use crate::call_manager::media::{MediaConstraints, MediaDevices, MediaTrack};
use crate::call_manager::peer_connection::{
    PeerConnection, PeerConnectionError, PeerConnectionFactory, PeerEvent,
};
use crate::log::log_sink::LogSink;
use crate::signaling::protocol::{
    Envelope, IceCandidate, ParticipantId, SdpType, SessionDescription,
};
use crate::signaling_client::SignalingEvent;
use crate::{sink_debug, sink_info, sink_warn};

/// Drives one client through the negotiation lifecycle of a single call.
///
/// Single-threaded: the owner feeds it user intents (`start_call`,
/// `accept_call`, ...), envelopes from the relay (`handle_envelope`) and
/// calls [`CallManager::poll`] regularly to pick up peer-connection events
/// and the offer timeout. Everything the presentation layer needs comes out
/// of [`CallManager::drain_events`].
pub struct CallManager {
    state: ConnectionState,
    sink: Box<dyn EnvelopeSink>,
    media: Box<dyn MediaDevices>,
    pc_factory: Box<dyn PeerConnectionFactory>,
    config: CallConfig,
    events: Vec<CallEvent>,
    log: Arc<dyn LogSink>,
}

impl CallManager {
    pub fn new(
        local_id: impl Into<ParticipantId>,
        sink: Box<dyn EnvelopeSink>,
        media: Box<dyn MediaDevices>,
        pc_factory: Box<dyn PeerConnectionFactory>,
        config: CallConfig,
        log: Arc<dyn LogSink>,
    ) -> Self {
        Self {
            state: ConnectionState::new(local_id),
            sink,
            media,
            pc_factory,
            config,
            events: Vec::new(),
            log,
        }
    }

    // ---- Queries ------------------------------------------------------------

    pub fn phase(&self) -> CallPhase {
        self.state.phase
    }

    /// True while an outgoing call is ringing or a call is up.
    pub fn is_in_call(&self) -> bool {
        matches!(self.state.phase, CallPhase::Calling | CallPhase::Connected)
    }

    pub fn local_id(&self) -> &str {
        &self.state.local_id
    }

    pub fn peer_id(&self) -> Option<&str> {
        self.state.peer_id.as_deref()
    }

    pub fn remote_tracks(&self) -> &[MediaTrack] {
        &self.state.remote_tracks
    }

    pub fn has_local_media(&self) -> bool {
        self.state.local_media.is_some()
    }

    pub fn has_peer_connection(&self) -> bool {
        self.state.peer.is_some()
    }

    /// Everything that happened since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<CallEvent> {
        std::mem::take(&mut self.events)
    }

    // ---- User intents -------------------------------------------------------

    /// Capture local media, create an offer and send it to `receiver_id`.
    ///
    /// Leaves the client `Calling` only once the offer went out; on any
    /// failure everything acquired so far is released and the client stays
    /// `Idle`.
    pub fn start_call(&mut self, receiver_id: &str) -> Result<(), CallError> {
        let receiver_id = receiver_id.trim();
        if receiver_id.is_empty() || receiver_id == self.state.local_id {
            sink_warn!(self.log, "[call] refusing to call {:?}", receiver_id);
            return Err(CallError::InvalidReceiver);
        }
        self.require_phase(CallPhase::Idle, "start a call")?;

        let media = match self.media.acquire(MediaConstraints::audio_video()) {
            Ok(media) => media,
            Err(e) => {
                sink_warn!(self.log, "[call] cannot call {}: {}", receiver_id, e);
                self.emit(CallEvent::Error(e.to_string()));
                return Err(e.into());
            }
        };
        self.state.local_media = Some(media);
        self.state.peer_id = Some(receiver_id.to_owned());

        if let Err(e) = self.send_offer(receiver_id) {
            sink_warn!(self.log, "[call] offer to {} failed: {}", receiver_id, e);
            self.state.reset();
            self.emit(CallEvent::Error(e.to_string()));
            return Err(e);
        }

        self.state.phase = CallPhase::Calling;
        self.state.offer_sent_at = Some(Instant::now());
        sink_info!(self.log, "[call] calling {}", receiver_id);
        self.emit(CallEvent::Calling {
            callee_id: receiver_id.to_owned(),
        });
        Ok(())
    }

    /// Accept the ringing call: capture media and answer the pending offer.
    ///
    /// If anything fails the caller is told the call was not accepted, so it
    /// is never left waiting.
    pub fn accept_call(&mut self) -> Result<(), CallError> {
        self.require_phase(CallPhase::RingingIncoming, "accept a call")?;
        let pending = (self.state.peer_id.clone(), self.state.pending_offer.take());
        let (Some(caller_id), Some(offer)) = pending else {
            self.state.reset();
            return Err(CallError::InvalidState {
                op: "accept a call",
                phase: CallPhase::Idle,
            });
        };

        match self.answer_offer(&caller_id, &offer) {
            Ok(()) => {
                self.state.phase = CallPhase::Connected;
                sink_info!(self.log, "[call] accepted call from {}", caller_id);
                self.emit(CallEvent::Connected { peer_id: caller_id });
                Ok(())
            }
            Err(e) => {
                sink_warn!(self.log, "[call] accepting call from {} failed: {}", caller_id, e);
                self.state.reset();
                if let Err(send_err) = self.send_decline(&caller_id) {
                    sink_warn!(self.log, "[call] could not notify {}: {}", caller_id, send_err);
                }
                self.emit(CallEvent::Error(e.to_string()));
                self.emit(CallEvent::Ended {
                    reason: EndReason::Failed(e.to_string()),
                });
                Err(e)
            }
        }
    }

    /// Refuse the ringing call. Never touches media.
    pub fn decline_call(&mut self) -> Result<(), CallError> {
        self.require_phase(CallPhase::RingingIncoming, "decline a call")?;
        let caller_id = self.state.peer_id.clone();
        self.state.reset();

        let sent = match caller_id {
            Some(caller_id) => {
                sink_info!(self.log, "[call] declined call from {}", caller_id);
                self.send_decline(&caller_id)
            }
            None => Ok(()),
        };
        self.emit(CallEvent::Ended {
            reason: EndReason::Declined,
        });
        sent
    }

    /// Hang up whatever is going on. Safe to call repeatedly.
    ///
    /// Cancels an outgoing call, declines a ringing one, ends a connected
    /// one. In `Idle` it does nothing.
    pub fn end_call(&mut self) -> Result<(), CallError> {
        match self.state.phase {
            CallPhase::Idle => Ok(()),
            CallPhase::RingingIncoming => self.decline_call(),
            CallPhase::Calling | CallPhase::Connected => {
                let sent = self.hang_up();
                self.emit(CallEvent::Ended {
                    reason: EndReason::LocalHangup,
                });
                sent
            }
        }
    }

    // ---- Inbound ------------------------------------------------------------

    /// Feed one event from the signaling client.
    pub fn handle_signaling_event(&mut self, ev: SignalingEvent) {
        match ev {
            SignalingEvent::Envelope(env) => self.handle_envelope(env),
            SignalingEvent::Pong { nonce } => {
                sink_debug!(self.log, "[call] relay pong {}", nonce);
            }
            SignalingEvent::Disconnected { reason } => {
                sink_warn!(self.log, "[call] relay link lost: {}", reason);
                if self.state.phase != CallPhase::Idle {
                    self.state.reset();
                    self.emit(CallEvent::Ended {
                        reason: EndReason::SignalingLost,
                    });
                }
                self.emit(CallEvent::Error(format!("relay link lost: {reason}")));
            }
        }
    }

    /// Apply one envelope routed to us by the relay.
    pub fn handle_envelope(&mut self, env: Envelope) {
        match env {
            Envelope::Offer {
                sender_id, offer, ..
            } => self.on_offer(sender_id, offer),
            Envelope::Answer {
                sender_id,
                answer,
                accepted,
                ..
            } => self.on_answer(&sender_id, answer, accepted),
            Envelope::Candidate {
                sender_id,
                candidate,
                ..
            } => self.on_remote_candidate(&sender_id, &candidate),
            Envelope::Terminate { sender_id, .. } => self.on_terminate(&sender_id),
        }
    }

    /// Drain peer-connection events and enforce the offer timeout.
    pub fn poll(&mut self) {
        self.drain_peer_events();
        self.tick(Instant::now());
    }

    /// Cancel an unanswered offer once it is older than the configured timeout.
    pub fn tick(&mut self, now: Instant) {
        if self.state.phase != CallPhase::Calling {
            return;
        }
        let Some(sent_at) = self.state.offer_sent_at else {
            return;
        };
        if now.saturating_duration_since(sent_at) < self.config.offer_timeout {
            return;
        }

        sink_info!(
            self.log,
            "[call] no answer from {:?} after {:?}; cancelling",
            self.state.peer_id,
            self.config.offer_timeout
        );
        if let Err(e) = self.hang_up() {
            sink_warn!(self.log, "[call] could not send termination: {}", e);
        }
        self.emit(CallEvent::Ended {
            reason: EndReason::Timeout,
        });
    }

    // ---- Envelope handlers --------------------------------------------------

    fn on_offer(&mut self, sender_id: ParticipantId, offer: SessionDescription) {
        if !offer.is(SdpType::Offer) {
            sink_warn!(
                self.log,
                "[call] rejecting offer from {} with type {:?}",
                sender_id,
                offer.sdp_type
            );
            return;
        }

        if self.state.phase != CallPhase::Idle {
            sink_info!(
                self.log,
                "[call] busy ({}); declining offer from {}",
                self.state.phase,
                sender_id
            );
            if let Err(e) = self.send_decline(&sender_id) {
                sink_warn!(self.log, "[call] could not decline {}: {}", sender_id, e);
            }
            return;
        }

        sink_info!(self.log, "[call] incoming call from {}", sender_id);
        self.state.peer_id = Some(sender_id.clone());
        self.state.pending_offer = Some(offer);
        self.state.phase = CallPhase::RingingIncoming;
        self.emit(CallEvent::IncomingCall {
            caller_id: sender_id,
        });
    }

    fn on_answer(&mut self, sender_id: &str, answer: Option<SessionDescription>, accepted: bool) {
        if self.state.phase != CallPhase::Calling || !self.state.is_peer(sender_id) {
            sink_warn!(
                self.log,
                "[call] ignoring answer from {} while {}",
                sender_id,
                self.state.phase
            );
            return;
        }

        if !accepted {
            sink_info!(self.log, "[call] {} declined the call", sender_id);
            self.state.reset();
            self.emit(CallEvent::Ended {
                reason: EndReason::Declined,
            });
            return;
        }

        if answer.as_ref().is_some_and(|a| a.is(SdpType::PrAnswer)) {
            // Provisional: apply it but keep waiting for the final answer.
            match self.apply_provisional_answer(answer) {
                Ok(()) => sink_debug!(self.log, "[call] provisional answer from {}", sender_id),
                Err(e) => self.abort_on_bad_answer(sender_id, e),
            }
            return;
        }

        match self.apply_answer(answer) {
            Ok(()) => {
                self.state.phase = CallPhase::Connected;
                self.state.offer_sent_at = None;
                sink_info!(self.log, "[call] connected with {}", sender_id);
                self.emit(CallEvent::Connected {
                    peer_id: sender_id.to_owned(),
                });
            }
            Err(e) => self.abort_on_bad_answer(sender_id, e),
        }
    }

    fn abort_on_bad_answer(&mut self, sender_id: &str, e: CallError) {
        sink_warn!(self.log, "[call] answer from {} unusable: {}", sender_id, e);
        if let Err(send_err) = self.hang_up() {
            sink_warn!(self.log, "[call] could not notify {}: {}", sender_id, send_err);
        }
        self.emit(CallEvent::Error(e.to_string()));
        self.emit(CallEvent::Ended {
            reason: EndReason::Failed(e.to_string()),
        });
    }

    fn on_remote_candidate(&mut self, sender_id: &str, candidate: &IceCandidate) {
        if !self.state.is_peer(sender_id) {
            sink_debug!(self.log, "[call] dropping candidate from non-peer {}", sender_id);
            return;
        }
        if !candidate.is_well_formed() {
            sink_warn!(self.log, "[call] dropping malformed candidate from {}", sender_id);
            return;
        }
        let Some(peer) = self.state.peer.as_deref_mut() else {
            sink_debug!(
                self.log,
                "[call] no peer connection yet; dropping candidate from {}",
                sender_id
            );
            return;
        };
        if let Err(e) = peer.add_ice_candidate(candidate) {
            sink_warn!(self.log, "[call] candidate from {} rejected: {}", sender_id, e);
        }
    }

    fn on_terminate(&mut self, sender_id: &str) {
        if self.state.phase == CallPhase::Idle || !self.state.is_peer(sender_id) {
            sink_debug!(self.log, "[call] ignoring termination from {}", sender_id);
            return;
        }
        sink_info!(self.log, "[call] {} ended the call ({})", sender_id, self.state.phase);
        self.state.reset();
        self.emit(CallEvent::Ended {
            reason: EndReason::RemoteHangup,
        });
    }

    fn drain_peer_events(&mut self) {
        let mut pending = Vec::new();
        if let Some(rx) = &self.state.peer_events {
            loop {
                match rx.try_recv() {
                    Ok(ev) => pending.push(ev),
                    Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
                }
            }
        }

        for ev in pending {
            match ev {
                PeerEvent::LocalCandidate(candidate) => self.send_local_candidate(candidate),
                PeerEvent::RemoteTrack(track) => {
                    sink_debug!(self.log, "[call] remote {} track {}", track.kind, track.id);
                    self.state.remote_tracks.push(track.clone());
                    self.emit(CallEvent::RemoteTrack(track));
                }
            }
        }
    }

    // ---- Negotiation steps --------------------------------------------------

    /// Peer connection with the local tracks attached.
    fn open_peer_connection(&mut self) -> Result<(), CallError> {
        let (events_tx, events_rx) = mpsc::channel::<PeerEvent>();
        let peer = self
            .pc_factory
            .create(&self.config.rtc_configuration(), events_tx)?;
        self.state.peer = Some(peer);
        self.state.peer_events = Some(events_rx);

        let tracks = self
            .state
            .local_media
            .as_ref()
            .map(|m| m.tracks())
            .unwrap_or_default();
        let peer = self.peer_mut()?;
        for track in &tracks {
            peer.add_track(track)?;
        }
        Ok(())
    }

    fn send_offer(&mut self, receiver_id: &str) -> Result<(), CallError> {
        self.open_peer_connection()?;
        let peer = self.peer_mut()?;
        let offer = peer.create_offer()?;
        peer.set_local_description(&offer)?;

        self.sink.send_envelope(Envelope::Offer {
            sender_id: self.state.local_id.clone(),
            receiver_id: receiver_id.to_owned(),
            offer,
        })?;
        Ok(())
    }

    fn answer_offer(&mut self, caller_id: &str, offer: &SessionDescription) -> Result<(), CallError> {
        let media = self.media.acquire(MediaConstraints::audio_video())?;
        self.state.local_media = Some(media);

        self.open_peer_connection()?;
        let peer = self.peer_mut()?;
        peer.set_remote_description(offer)?;
        let answer = peer.create_answer()?;
        peer.set_local_description(&answer)?;

        self.sink.send_envelope(Envelope::Answer {
            sender_id: self.state.local_id.clone(),
            receiver_id: caller_id.to_owned(),
            answer: Some(answer),
            accepted: true,
        })?;
        Ok(())
    }

    fn apply_answer(&mut self, answer: Option<SessionDescription>) -> Result<(), CallError> {
        let answer = answer
            .filter(|a| a.is(SdpType::Answer))
            .ok_or(CallError::InvalidDescription)?;
        self.peer_mut()?.set_remote_description(&answer)?;
        Ok(())
    }

    fn apply_provisional_answer(&mut self, answer: Option<SessionDescription>) -> Result<(), CallError> {
        let answer = answer
            .filter(|a| a.is(SdpType::PrAnswer))
            .ok_or(CallError::InvalidDescription)?;
        self.peer_mut()?.set_remote_description(&answer)?;
        Ok(())
    }

    // ---- Helpers ------------------------------------------------------------

    fn peer_mut(&mut self) -> Result<&mut Box<dyn PeerConnection>, CallError> {
        Ok(self
            .state
            .peer
            .as_mut()
            .ok_or(PeerConnectionError::Closed)?)
    }

    fn require_phase(&self, expected: CallPhase, op: &'static str) -> Result<(), CallError> {
        if self.state.phase == expected {
            Ok(())
        } else {
            Err(CallError::InvalidState {
                op,
                phase: self.state.phase,
            })
        }
    }

    /// Tell the peer we are done, then tear down. Teardown happens even if
    /// the notice cannot be sent.
    fn hang_up(&mut self) -> Result<(), CallError> {
        let sent = match self.state.peer_id.clone() {
            Some(peer_id) => self
                .sink
                .send_envelope(Envelope::Terminate {
                    sender_id: self.state.local_id.clone(),
                    receiver_id: peer_id,
                })
                .map_err(CallError::from),
            None => Ok(()),
        };
        self.state.reset();
        sent
    }

    fn send_decline(&self, caller_id: &str) -> Result<(), CallError> {
        self.sink.send_envelope(Envelope::Answer {
            sender_id: self.state.local_id.clone(),
            receiver_id: caller_id.to_owned(),
            answer: None,
            accepted: false,
        })?;
        Ok(())
    }

    fn send_local_candidate(&mut self, candidate: IceCandidate) {
        let Some(peer_id) = self.state.peer_id.clone() else {
            return;
        };
        let env = Envelope::Candidate {
            sender_id: self.state.local_id.clone(),
            receiver_id: peer_id,
            candidate,
        };
        if let Err(e) = self.sink.send_envelope(env) {
            sink_warn!(self.log, "[call] could not send candidate: {}", e);
        }
    }

    fn emit(&mut self, ev: CallEvent) {
        self.events.push(ev);
    }
}

impl Drop for CallManager {
    fn drop(&mut self) {
        // Release devices even if the owner never hung up.
        self.state.reset();
    }
}
