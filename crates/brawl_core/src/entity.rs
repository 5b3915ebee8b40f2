//! Ability entities and their arena.
//!
//! An entity is one live cast. Exactly one peer simulates it
//! authoritatively; every other peer holds a mirror whose phase changes
//! come from replication events and whose position is corrected by
//! snapshots. Lifecycle is strictly `Alive -> Dying -> Destroyed`: no
//! machine skips the teardown window, and `Destroyed` is terminal.

use std::collections::HashMap;

use brawl_net::{AbilityId, EntityId, Interpolator, PlayerId};
use glam::Vec3;

use crate::abilities::AbilityState;
use crate::hit::HitGuard;

/// Lifecycle of an ability entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Simulating and interacting.
    Alive,
    /// Teardown window: interaction disabled, subscriptions released.
    Dying {
        /// Tick at which the entity is removed.
        until: u64,
    },
    /// Terminal; removed from the arena at the end of the tick.
    Destroyed,
}

/// One live cast.
#[derive(Debug, Clone)]
pub struct AbilityEntity {
    /// Globally unique id; the allocating peer is packed into the high
    /// bits and starts as the authority.
    pub id: EntityId,
    /// Which definition this entity runs.
    pub ability: AbilityId,
    /// Player credited with the cast. Equal to [`Self::owner`] except for
    /// follow-up casts the host runs on behalf of a disconnected caster.
    pub caster: PlayerId,
    /// Current position.
    pub position: Vec3,
    /// Heading, degrees.
    pub yaw: f32,
    /// Travel speed, metres per second.
    pub speed: f32,
    /// Per-tick yaw delta chosen by the caster at cast time.
    pub curve: f32,
    /// Tick the entity spawned.
    pub spawned_at: u64,
    /// Caster contacts are ignored before this tick.
    pub armed_at: u64,
    /// Tick at which the entity dies unless a machine extends it.
    pub death_deadline: u64,
    /// Current lifecycle.
    pub lifecycle: Lifecycle,
    /// Hit-once bookkeeping.
    pub guard: HitGuard,
    /// Machine-specific state.
    pub state: AbilityState,
    /// Mirror-side position correction; `None` on the authoritative peer.
    pub remote: Option<Interpolator>,
}

impl AbilityEntity {
    /// The peer that cast this entity.
    #[must_use]
    pub fn owner(&self) -> PlayerId {
        self.id.owner()
    }

    /// Whether the entity still interacts with the world.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        matches!(self.lifecycle, Lifecycle::Alive)
    }

    /// Enter the teardown window. Idempotent: a second call on an already
    /// dying or destroyed entity does nothing and returns `false`, so
    /// subscriptions are only released once.
    pub fn begin_dying(&mut self, until: u64) -> bool {
        if !self.is_alive() {
            return false;
        }
        self.lifecycle = Lifecycle::Dying { until };
        true
    }

    /// Whether the teardown window has elapsed at tick `now`.
    #[must_use]
    pub fn teardown_elapsed(&self, now: u64) -> bool {
        match self.lifecycle {
            Lifecycle::Dying { until } => now >= until,
            Lifecycle::Destroyed => true,
            Lifecycle::Alive => false,
        }
    }
}

/// Storage for all entities this peer knows about, owned and mirrored.
///
/// `HashMap` for O(1) lookup, with sorted ids for deterministic tick
/// iteration.
#[derive(Debug, Clone, Default)]
pub struct EntityStorage {
    entities: HashMap<EntityId, AbilityEntity>,
}

impl EntityStorage {
    /// Create empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entity under its own id. Returns `false` (and leaves the
    /// existing entity untouched) if the id is already present - duplicate
    /// spawn events must not double-spawn.
    pub fn insert(&mut self, entity: AbilityEntity) -> bool {
        match self.entities.entry(entity.id) {
            std::collections::hash_map::Entry::Occupied(_) => false,
            std::collections::hash_map::Entry::Vacant(v) => {
                v.insert(entity);
                true
            }
        }
    }

    /// Remove an entity.
    pub fn remove(&mut self, id: EntityId) -> Option<AbilityEntity> {
        self.entities.remove(&id)
    }

    /// Get an entity.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&AbilityEntity> {
        self.entities.get(&id)
    }

    /// Get a mutable reference to an entity.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut AbilityEntity> {
        self.entities.get_mut(&id)
    }

    /// Whether an entity exists.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the arena is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Sorted entity ids for deterministic iteration.
    #[must_use]
    pub fn sorted_ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<_> = self.entities.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Iterate over all entities (not in deterministic order).
    pub fn iter(&self) -> impl Iterator<Item = (&EntityId, &AbilityEntity)> {
        self.entities.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abilities::bolt::BoltState;

    fn entity(owner: u32, seq: u32) -> AbilityEntity {
        AbilityEntity {
            id: EntityId::compose(PlayerId(owner), seq),
            ability: AbilityId(5),
            caster: PlayerId(owner),
            position: Vec3::ZERO,
            yaw: 0.0,
            speed: 10.0,
            curve: 0.0,
            spawned_at: 0,
            armed_at: 0,
            death_deadline: 100,
            lifecycle: Lifecycle::Alive,
            guard: HitGuard::new(),
            state: AbilityState::Bolt(BoltState),
            remote: None,
        }
    }

    #[test]
    fn begin_dying_is_idempotent() {
        let mut e = entity(1, 1);
        assert!(e.begin_dying(50));
        assert!(!e.begin_dying(60));
        assert_eq!(e.lifecycle, Lifecycle::Dying { until: 50 });
    }

    #[test]
    fn teardown_elapses_at_the_deadline() {
        let mut e = entity(1, 1);
        e.begin_dying(50);
        assert!(!e.teardown_elapsed(49));
        assert!(e.teardown_elapsed(50));
    }

    #[test]
    fn duplicate_insert_does_not_double_spawn() {
        let mut storage = EntityStorage::new();
        assert!(storage.insert(entity(1, 1)));
        assert!(!storage.insert(entity(1, 1)));
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn sorted_ids_are_deterministic() {
        let mut storage = EntityStorage::new();
        storage.insert(entity(2, 1));
        storage.insert(entity(1, 9));
        storage.insert(entity(1, 2));
        let ids = storage.sorted_ids();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }
}
