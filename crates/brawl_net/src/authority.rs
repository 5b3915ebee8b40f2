//! Authority tracking: which peer simulates which entity.
//!
//! Every entity has exactly one authoritative peer at all times - the owner
//! while it is connected. When the owner disconnects, decisions that need
//! world state (targeting, damage, detonation) fall to the session host;
//! peers that are neither owner nor host free-run the entity to its death
//! timer without making authoritative decisions.

use std::collections::BTreeSet;

use crate::ids::{EntityId, PlayerId};

/// Connection and host bookkeeping for authority resolution.
#[derive(Debug, Clone)]
pub struct AuthorityMap {
    connected: BTreeSet<PlayerId>,
    host: PlayerId,
}

impl AuthorityMap {
    /// Create a map over the initially connected peers. The host defaults
    /// to the lowest connected id; override with [`set_host`](Self::set_host)
    /// if the lobby elected someone else.
    #[must_use]
    pub fn new(connected: impl IntoIterator<Item = PlayerId>) -> Self {
        let connected: BTreeSet<_> = connected.into_iter().collect();
        let host = connected.iter().next().copied().unwrap_or_default();
        Self { connected, host }
    }

    /// The current session host.
    #[must_use]
    pub fn host(&self) -> PlayerId {
        self.host
    }

    /// Override the elected host.
    pub fn set_host(&mut self, host: PlayerId) {
        self.host = host;
    }

    /// Whether a peer is still connected.
    #[must_use]
    pub fn is_connected(&self, player: PlayerId) -> bool {
        self.connected.contains(&player)
    }

    /// Record a newly connected peer.
    pub fn connect(&mut self, player: PlayerId) {
        self.connected.insert(player);
    }

    /// Record a disconnect. If the host left, the lowest remaining id
    /// becomes host; in-flight entities keep whatever authority resolution
    /// says from now on, there is no per-entity re-election.
    pub fn disconnect(&mut self, player: PlayerId) {
        self.connected.remove(&player);
        if player == self.host {
            if let Some(&next) = self.connected.iter().next() {
                tracing::info!(old = %player, new = %next, "Host disconnected, promoting");
                self.host = next;
            }
        }
    }

    /// The peer currently authoritative for an entity.
    #[must_use]
    pub fn authority_of(&self, entity: EntityId) -> PlayerId {
        let owner = entity.owner();
        if self.is_connected(owner) {
            owner
        } else {
            self.host
        }
    }

    /// Whether `local` should run authoritative simulation for an entity.
    #[must_use]
    pub fn is_authoritative(&self, local: PlayerId, entity: EntityId) -> bool {
        self.authority_of(entity) == local
    }
}
