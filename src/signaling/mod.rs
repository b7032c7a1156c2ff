//! The relay: accepts call clients, binds each connection to the identity
//! it registers, and forwards envelopes to their receiver.

pub mod protocol;
pub mod registry;
pub mod router;
pub mod run;
pub mod runtime;
pub mod server_engine;
pub mod server_event;
pub mod signaling_server;
pub mod tls;
pub mod transport;
pub mod types;

pub use registry::{InMemoryRegistrationStore, RegistrationStore};
pub use run::{run_relay_server, run_relay_server_with_log};
pub use signaling_server::SignalingServer;
