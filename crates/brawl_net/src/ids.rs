//! Identifier newtypes shared across the engine and the wire format.

use serde::{Deserialize, Serialize};

/// A connected peer (one player per peer).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct PlayerId(pub u32);

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// A damageable unit in the host world (wizard, crystal, creature).
///
/// Weak reference: the referent may vanish at any tick and every holder
/// must tolerate resolution failing.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct UnitId(pub u64);

/// A registered ability definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AbilityId(pub u16);

/// A live ability entity.
///
/// The owning peer's id lives in the high 32 bits and a per-peer counter in
/// the low 32, so ids are globally unique without any cross-peer
/// coordination.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct EntityId(pub u64);

impl EntityId {
    /// Compose an entity id from its owning peer and a local counter.
    #[must_use]
    pub const fn compose(owner: PlayerId, seq: u32) -> Self {
        Self(((owner.0 as u64) << 32) | seq as u64)
    }

    /// The peer that allocated this id (and starts as its authority).
    #[must_use]
    pub const fn owner(self) -> PlayerId {
        PlayerId((self.0 >> 32) as u32)
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "e{}:{}", self.owner().0, self.0 as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_id_packs_owner() {
        let id = EntityId::compose(PlayerId(3), 41);
        assert_eq!(id.owner(), PlayerId(3));
        assert_eq!(id.0 & 0xFFFF_FFFF, 41);
    }

    #[test]
    fn entity_ids_from_different_owners_never_collide() {
        let a = EntityId::compose(PlayerId(1), 7);
        let b = EntityId::compose(PlayerId(2), 7);
        assert_ne!(a, b);
    }
}
