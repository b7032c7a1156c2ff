use std::collections::{HashMap, HashSet};

use crate::signaling::protocol::ParticipantId;
use crate::signaling::registry::RegistrationStore;
use crate::signaling::types::ClientId;

/// Registration Table kept in two maps so both register and disconnect are
/// O(1) per identity.
#[derive(Debug, Default)]
pub struct InMemoryRegistrationStore {
    identity_to_client: HashMap<ParticipantId, ClientId>,
    client_to_identities: HashMap<ClientId, HashSet<ParticipantId>>,
}

impl InMemoryRegistrationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identities currently bound to `client` (sorted, for stable output).
    pub fn identities_for(&self, client: ClientId) -> Vec<ParticipantId> {
        let mut ids: Vec<ParticipantId> = self
            .client_to_identities
            .get(&client)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }
}

impl RegistrationStore for InMemoryRegistrationStore {
    fn bind(&mut self, identity: ParticipantId, client: ClientId) -> Option<ClientId> {
        let previous = self.identity_to_client.insert(identity.clone(), client);

        // The old connection keeps running but must no longer own this
        // identity, otherwise its disconnect would unbind the new one.
        if let Some(old) = previous.filter(|old| *old != client) {
            if let Some(set) = self.client_to_identities.get_mut(&old) {
                set.remove(&identity);
                if set.is_empty() {
                    self.client_to_identities.remove(&old);
                }
            }
        }

        self.client_to_identities
            .entry(client)
            .or_default()
            .insert(identity);

        previous.filter(|old| *old != client)
    }

    fn lookup(&self, identity: &str) -> Option<ClientId> {
        self.identity_to_client.get(identity).copied()
    }

    fn unbind_client(&mut self, client: ClientId) -> Vec<ParticipantId> {
        let Some(identities) = self.client_to_identities.remove(&client) else {
            return Vec::new();
        };

        let mut removed = Vec::with_capacity(identities.len());
        for identity in identities {
            if self.identity_to_client.get(&identity) == Some(&client) {
                self.identity_to_client.remove(&identity);
                removed.push(identity);
            }
        }
        removed.sort();
        removed
    }

    fn len(&self) -> usize {
        self.identity_to_client.len()
    }
}
