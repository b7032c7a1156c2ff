//! Client-side negotiation state machine.
//!
//! A [`CallManager`] owns the one call a client can hold. It talks to the
//! relay through an [`EnvelopeSink`], and to the outside world through the
//! [`MediaDevices`] and [`PeerConnectionFactory`] traits, which the
//! embedding application implements.

pub mod call_config;
pub mod call_error;
pub mod call_event;
#[allow(clippy::module_inception)]
pub mod call_manager;
pub mod call_phase;
pub mod connection_state;
pub mod envelope_sink;
pub mod media;
pub mod peer_connection;


pub use call_config::CallConfig;
pub use call_error::CallError;
pub use call_event::{CallEvent, EndReason};
pub use call_manager::CallManager;
pub use call_phase::CallPhase;
pub use envelope_sink::EnvelopeSink;
pub use media::{LocalMedia, MediaConstraints, MediaDevices, MediaError, MediaTrack, TrackKind};
pub use peer_connection::{
    PeerConnection, PeerConnectionError, PeerConnectionFactory, PeerEvent, RtcConfiguration,
};
