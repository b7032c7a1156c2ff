use crate::signaling::protocol::ParticipantId;
use crate::signaling::types::ClientId;

/// Pluggable Registration Table: participant identity -> live connection.
///
/// The server engine only routes through this trait, so the in-memory map
/// can be swapped for a shared registry without touching routing.
///
/// Implementations must keep at most one connection per identity
/// (last registration wins).
pub trait RegistrationStore: Send {
    /// Bind `identity` to `client`, replacing any previous binding.
    ///
    /// Returns the previously bound connection, if it was a different one.
    fn bind(&mut self, identity: ParticipantId, client: ClientId) -> Option<ClientId>;

    /// Connection currently bound to `identity`.
    fn lookup(&self, identity: &str) -> Option<ClientId>;

    /// Remove every binding that points at `client`; returns the identities
    /// that were unbound.
    fn unbind_client(&mut self, client: ClientId) -> Vec<ParticipantId>;

    /// Number of bound identities.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
