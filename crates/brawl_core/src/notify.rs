//! The per-player damage-notification feed.
//!
//! Two subscription channels over the same damage stream:
//! - wards subscribe by **victim**: "tell me when my protected player takes
//!   damage" - the reaction that lets a ward claim the attacker;
//! - teleport strikes subscribe by **attacker**: "tell me when my caster
//!   deals damage" - the accumulation that builds the strike's mark list.
//!
//! Subscriber lists are always snapshotted before dispatch. A notified
//! ward's reaction can kill another subscriber in the same chain (the
//! counter damage can destroy the attacker's own ward), so iterating the
//! live list would invalidate it mid-dispatch.
//!
//! This registry is owned by the session - never a global - so two
//! concurrent sessions in one process cannot observe each other's wards.

use std::collections::HashMap;

use brawl_net::{EntityId, PlayerId, UnitId};

/// One damage occurrence flowing through the feed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageNotice {
    /// Player credited with the damage.
    pub attacker: PlayerId,
    /// The attacker's caster unit at the time, if resolvable.
    pub attacker_unit: Option<UnitId>,
    /// Player whose unit was damaged.
    pub victim: PlayerId,
    /// The damaged unit.
    pub victim_unit: UnitId,
    /// Post-mitigation amount.
    pub amount: f32,
}

/// Subscription registry for damage notifications.
#[derive(Debug, Clone, Default)]
pub struct DamageFeed {
    wards_by_victim: HashMap<PlayerId, Vec<EntityId>>,
    marks_by_attacker: HashMap<PlayerId, Vec<EntityId>>,
}

impl DamageFeed {
    /// Create an empty feed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a ward entity to damage taken by `victim`.
    pub fn subscribe_ward(&mut self, victim: PlayerId, entity: EntityId) {
        let subs = self.wards_by_victim.entry(victim).or_default();
        if !subs.contains(&entity) {
            subs.push(entity);
        }
    }

    /// Subscribe a strike entity to damage dealt by `attacker`.
    pub fn subscribe_marks(&mut self, attacker: PlayerId, entity: EntityId) {
        let subs = self.marks_by_attacker.entry(attacker).or_default();
        if !subs.contains(&entity) {
            subs.push(entity);
        }
    }

    /// Remove every subscription held by an entity. Called exactly once,
    /// when the entity begins dying.
    pub fn unsubscribe_all(&mut self, entity: EntityId) {
        for subs in self.wards_by_victim.values_mut() {
            subs.retain(|&e| e != entity);
        }
        for subs in self.marks_by_attacker.values_mut() {
            subs.retain(|&e| e != entity);
        }
    }

    /// Snapshot of the wards watching a victim. The clone is deliberate:
    /// dispatch iterates the snapshot while handlers mutate the registry.
    #[must_use]
    pub fn wards_for(&self, victim: PlayerId) -> Vec<EntityId> {
        self.wards_by_victim
            .get(&victim)
            .cloned()
            .unwrap_or_default()
    }

    /// Snapshot of the strikes accumulating an attacker's damage.
    #[must_use]
    pub fn marks_for(&self, attacker: PlayerId) -> Vec<EntityId> {
        self.marks_by_attacker
            .get(&attacker)
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn e(owner: u32, seq: u32) -> EntityId {
        EntityId::compose(PlayerId(owner), seq)
    }

    #[test]
    fn ward_subscriptions_are_per_victim() {
        let mut feed = DamageFeed::new();
        feed.subscribe_ward(PlayerId(1), e(1, 1));
        feed.subscribe_ward(PlayerId(2), e(2, 1));
        assert_eq!(feed.wards_for(PlayerId(1)), vec![e(1, 1)]);
        assert_eq!(feed.wards_for(PlayerId(3)), Vec::new());
    }

    #[test]
    fn duplicate_subscription_is_absorbed() {
        let mut feed = DamageFeed::new();
        feed.subscribe_ward(PlayerId(1), e(1, 1));
        feed.subscribe_ward(PlayerId(1), e(1, 1));
        assert_eq!(feed.wards_for(PlayerId(1)).len(), 1);
    }

    #[test]
    fn unsubscribe_all_clears_both_channels() {
        let mut feed = DamageFeed::new();
        feed.subscribe_ward(PlayerId(1), e(1, 1));
        feed.subscribe_marks(PlayerId(1), e(1, 1));
        feed.unsubscribe_all(e(1, 1));
        assert!(feed.wards_for(PlayerId(1)).is_empty());
        assert!(feed.marks_for(PlayerId(1)).is_empty());
    }

    #[test]
    fn snapshot_is_unaffected_by_later_mutation() {
        let mut feed = DamageFeed::new();
        feed.subscribe_ward(PlayerId(1), e(1, 1));
        let snapshot = feed.wards_for(PlayerId(1));
        feed.unsubscribe_all(e(1, 1));
        assert_eq!(snapshot, vec![e(1, 1)]);
    }
}
