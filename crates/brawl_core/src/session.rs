//! The per-peer simulation session.
//!
//! One `Session` per connected peer. It owns the entity arena, the ability
//! catalog binding, the replication channel, the damage feed, and the
//! tether registry - there are no globals, so two sessions in one process
//! (as in the loopback tests) cannot observe each other except through
//! frames.
//!
//! # Tick Order
//!
//! Each fixed tick runs in this order:
//! 1. **Follow-ups** - casts queued by machines last tick spawn now
//! 2. **Contacts** - collision begin/end routed to the owning machines
//! 3. **Machine steps** - authoritative entities step their machines;
//!    mirrors free-run their travel and death timers
//! 4. **Position sync** - authoritative movers publish snapshots
//! 5. **Damage dispatch** - this tick's damage flows through the feed
//!    (ward claims, strike marks) with snapshotted subscriber lists
//! 6. **Reaping** - entities whose teardown elapsed are removed
//!
//! Nothing in the tick blocks: frames are fire-and-forget and every wait
//! inside a machine is a state plus an absolute tick deadline.

use std::collections::HashMap;

use brawl_net::{
    AbilityId, AuthorityMap, EntityId, EventChannel, EventKind, Frame, Inbox, Interpolator,
    PlayerId, Scope, Transport, UnitId,
};
use glam::Vec3;

use crate::abilities::{self, strike, tether, ward, AbilityState, FollowUp, StepCtx};
use crate::catalog::{AbilityCatalog, AbilityDef, AbilitySlot, MachineKind};
use crate::entity::{AbilityEntity, EntityStorage, Lifecycle};
use crate::error::{EngineError, Result};
use crate::hit::HitGuard;
use crate::math;
use crate::notify::{DamageFeed, DamageNotice};
use crate::spatial::SpatialIndex;
use crate::world::GameWorld;

/// Simulation ticks per second.
pub const TICK_RATE: u32 = 30;

/// Duration of one tick in seconds.
#[allow(clippy::cast_precision_loss)]
pub const TICK_SECONDS: f32 = 1.0 / TICK_RATE as f32;

/// Convert a duration in seconds to a tick count, rounding up so a
/// non-zero wait is never shortened to zero ticks.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn secs_to_ticks(secs: f32) -> u64 {
    (secs * TICK_RATE as f32).ceil().max(0.0) as u64
}

/// What a collision touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    /// A damageable unit.
    Unit(UnitId),
    /// Terrain.
    Surface,
}

/// Whether a contact began or ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactPhase {
    /// Bodies came into contact.
    Begin,
    /// Bodies separated; clears the hit-once entry for the pair.
    End,
}

/// One collision report fed into [`Session::tick`] by the host physics.
#[derive(Debug, Clone, Copy)]
pub struct Contact {
    /// The ability entity involved.
    pub entity: EntityId,
    /// What it touched.
    pub kind: ContactKind,
    /// Begin or end.
    pub phase: ContactPhase,
}

/// Parameters for a local cast.
#[derive(Debug, Clone, Copy)]
pub struct CastParams {
    /// Which ability.
    pub ability: AbilityId,
    /// Spawn position.
    pub position: Vec3,
    /// Initial heading, degrees.
    pub yaw: f32,
    /// Per-tick yaw curve.
    pub curve: f32,
}

/// What a cast did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastOutcome {
    /// A new entity spawned.
    Spawned(EntityId),
    /// A live tether in the slot absorbed the cast as its pull recast.
    TetherPulled(EntityId),
    /// A live tether in the slot absorbed the cast by detaching.
    TetherDetached(EntityId),
}

/// Events generated during one tick, for the embedding game layer.
#[derive(Debug, Clone, Default)]
pub struct TickEvents {
    /// Entities that entered their teardown window this tick.
    pub deaths: Vec<EntityId>,
    /// Entities removed from the arena this tick.
    pub destroyed: Vec<EntityId>,
    /// Damage applied by this peer's entities this tick.
    pub damage: Vec<DamageNotice>,
}

/// The per-peer ability simulation.
pub struct Session {
    local: PlayerId,
    tick: u64,
    catalog: AbilityCatalog,
    entities: EntityStorage,
    next_seq: u32,
    authority: AuthorityMap,
    channel: EventChannel,
    inbox: Inbox,
    feed: DamageFeed,
    tethers: HashMap<(PlayerId, AbilitySlot), EntityId>,
    pending_follow_ups: Vec<FollowUp>,
    pending_notices: Vec<DamageNotice>,
}

impl Session {
    /// Create a session for `local` over the initially connected peers.
    #[must_use]
    pub fn new(
        local: PlayerId,
        catalog: AbilityCatalog,
        peers: impl IntoIterator<Item = PlayerId>,
    ) -> Self {
        Self {
            local,
            tick: 0,
            catalog,
            entities: EntityStorage::new(),
            next_seq: 0,
            authority: AuthorityMap::new(peers),
            channel: EventChannel::new(),
            inbox: Inbox::new(),
            feed: DamageFeed::new(),
            tethers: HashMap::new(),
            pending_follow_ups: Vec::new(),
            pending_notices: Vec::new(),
        }
    }

    /// This peer's id.
    #[must_use]
    pub fn local_player(&self) -> PlayerId {
        self.local
    }

    /// The current session host.
    #[must_use]
    pub fn host(&self) -> PlayerId {
        self.authority.host()
    }

    /// Current tick number.
    #[must_use]
    pub const fn current_tick(&self) -> u64 {
        self.tick
    }

    /// The entity arena.
    #[must_use]
    pub fn entities(&self) -> &EntityStorage {
        &self.entities
    }

    /// Get an entity.
    #[must_use]
    pub fn get_entity(&self, id: EntityId) -> Option<&AbilityEntity> {
        self.entities.get(id)
    }

    /// Replace the catalog, e.g. after a module reload. Surviving entities
    /// keep their ids and re-resolve their definitions next tick; entities
    /// whose ability no longer exists tear down then.
    pub fn rebind_catalog(&mut self, catalog: AbilityCatalog) {
        self.catalog = catalog;
    }

    /// Record a newly connected peer.
    pub fn player_connected(&mut self, player: PlayerId) {
        self.authority.connect(player);
    }

    /// Record a disconnect. Entities owned by the leaver fall to the host
    /// for world-tied decisions; other peers free-run them to their death
    /// timers.
    pub fn player_disconnected(&mut self, player: PlayerId) {
        tracing::info!(player = %player, "Player disconnected");
        self.authority.disconnect(player);
    }

    /// Cast an ability for the local player.
    ///
    /// A cast into a slot that already holds a live tether never spawns:
    /// it becomes the tether's recast - a detach when the new cast's curve
    /// diverges past the detach threshold, a pull otherwise.
    pub fn cast(&mut self, world: &mut dyn GameWorld, params: CastParams) -> Result<CastOutcome> {
        let def = self
            .catalog
            .get(params.ability)
            .cloned()
            .ok_or(EngineError::UnknownAbility(params.ability))?;

        if def.machine == MachineKind::Tether {
            if let Some(&existing) = self.tethers.get(&(self.local, def.slot)) {
                if self.entities.get(existing).is_some_and(AbilityEntity::is_alive) {
                    let detach_curve = def
                        .tether
                        .map_or(0.2, |t| t.detach_curve);
                    let spatial = SpatialIndex::build(world);
                    let mut scratch = Vec::new();
                    let detach = params.curve.abs() > detach_curve;
                    self.with_entity(world, &spatial, existing, &mut scratch, |ctx, entity| {
                        if detach {
                            tether::detach(ctx, entity);
                        } else {
                            tether::trigger_pull(ctx, entity);
                        }
                    });
                    self.pending_notices.append(&mut scratch);
                    self.cleanup_if_dead(existing);
                    return Ok(if detach {
                        CastOutcome::TetherDetached(existing)
                    } else {
                        CastOutcome::TetherPulled(existing)
                    });
                }
                self.tethers.remove(&(self.local, def.slot));
            }
        }

        let id = self.spawn_entity(self.local, &def, params.position, params.yaw, params.curve);
        Ok(CastOutcome::Spawned(id))
    }

    /// Cancel every entity cast by a player (caster incapacitated).
    /// Idempotent: already-dying entities are untouched.
    pub fn cancel_player(&mut self, player: PlayerId) {
        for id in self.entities.sorted_ids() {
            let Some(entity) = self.entities.get(id) else {
                continue;
            };
            if entity.caster == player && entity.is_alive() {
                self.kill_entity(id);
            }
        }
    }

    /// Feed an externally applied damage occurrence (the host's own combat
    /// systems) through the ward/strike notification channels. Dispatched
    /// during the next tick.
    pub fn notify_damage(&mut self, notice: DamageNotice) {
        self.pending_notices.push(notice);
    }

    /// Drain queued replication frames for transmission.
    #[must_use]
    pub fn drain_frames(&mut self) -> Vec<Frame> {
        self.channel.drain()
    }

    /// Encode and send every queued frame. Peers outside a frame's scope
    /// drop it on receipt.
    pub fn flush(&mut self, transport: &dyn Transport) {
        for frame in self.channel.drain() {
            match frame.encode() {
                Ok(bytes) => {
                    if !transport.try_send(bytes) {
                        tracing::warn!(entity = %frame.event.entity, "Transport refused frame");
                    }
                }
                Err(e) => tracing::warn!(error = %e, "Failed to encode frame"),
            }
        }
    }

    /// Drain the transport and apply every addressed frame.
    pub fn pump(&mut self, world: &mut dyn GameWorld, transport: &dyn Transport) {
        for bytes in transport.drain() {
            if let Err(e) = self.handle_frame(world, &bytes) {
                tracing::warn!(error = %e, "Dropping undecodable frame");
            }
        }
    }

    /// Decode one frame and apply it if it is addressed to this peer and
    /// survives the inbox's duplicate/reorder guard.
    pub fn handle_frame(&mut self, world: &mut dyn GameWorld, bytes: &[u8]) -> Result<()> {
        let frame = Frame::decode(bytes)?;
        if !frame.addressed_to(self.local) || frame.sender == self.local {
            return Ok(());
        }
        if self.inbox.admit(&frame.event) {
            self.apply_event(world, &frame.event.kind, frame.event.entity);
        }
        Ok(())
    }

    /// Advance the simulation by one tick.
    pub fn tick(&mut self, world: &mut dyn GameWorld, contacts: &[Contact]) -> TickEvents {
        let mut events = TickEvents::default();
        let spatial = SpatialIndex::build(world);
        let mut damage: Vec<DamageNotice> = Vec::new();

        // 1. Follow-up casts queued by machines last tick.
        let follow_ups = std::mem::take(&mut self.pending_follow_ups);
        for fu in follow_ups {
            match self.catalog.get(fu.ability).cloned() {
                Some(def) => {
                    self.spawn_entity(fu.caster, &def, fu.position, fu.yaw, 0.0);
                }
                None => {
                    tracing::warn!(ability = ?fu.ability, "Follow-up references unknown ability");
                }
            }
        }

        // Aliveness is sampled before contacts are routed, so an entity a
        // contact kills is still reported in this tick's deaths.
        let alive_at_entry: Vec<EntityId> = self
            .entities
            .sorted_ids()
            .into_iter()
            .filter(|&id| self.entities.get(id).is_some_and(AbilityEntity::is_alive))
            .collect();

        // 2. Contacts.
        for contact in contacts {
            self.route_contact(world, &spatial, *contact, &mut damage);
        }

        // 3. Machine steps, deterministic order.
        for id in self.entities.sorted_ids() {
            let was_alive = alive_at_entry.contains(&id);
            if self.authority.is_authoritative(self.local, id) {
                self.with_entity(world, &spatial, id, &mut damage, |ctx, entity| {
                    abilities::step_machine(ctx, entity);
                    if entity.is_alive() && ctx.now >= entity.death_deadline {
                        abilities::die(ctx, entity);
                    }
                });
            } else {
                self.free_run(id);
            }
            self.cleanup_if_dead(id);
            if was_alive && self.entities.get(id).is_some_and(|e| !e.is_alive()) {
                events.deaths.push(id);
            }
        }

        // 4. Position snapshots for authoritative movers.
        for id in self.entities.sorted_ids() {
            if !self.authority.is_authoritative(self.local, id) {
                continue;
            }
            if let Some(entity) = self.entities.get(id) {
                if entity.is_alive() && entity.speed > 0.0 {
                    self.channel.publish(
                        self.local,
                        Scope::OthersOnly,
                        id,
                        EventKind::PositionSync {
                            position: entity.position,
                            yaw: entity.yaw,
                        },
                    );
                }
            }
        }

        // 5. Damage dispatch: this tick's applications plus host-fed ones.
        let mut notices = std::mem::take(&mut self.pending_notices);
        notices.append(&mut damage);
        for notice in &notices {
            self.dispatch_notice(world, &spatial, *notice);
        }
        events.damage = notices;

        // 6. Reap entities whose teardown elapsed.
        for id in self.entities.sorted_ids() {
            let gone = self
                .entities
                .get(id)
                .is_some_and(|e| e.teardown_elapsed(self.tick));
            if gone {
                self.entities.remove(id);
                self.channel.forget(id);
                self.inbox.forget(id);
                self.feed.unsubscribe_all(id);
                self.tethers.retain(|_, &mut e| e != id);
                events.destroyed.push(id);
            }
        }

        self.tick += 1;
        events
    }

    /// Variable-rate presentation step: lerp mirror positions toward the
    /// latest snapshot. Authoritative entities are untouched.
    pub fn presentation_step(&mut self) {
        for id in self.entities.sorted_ids() {
            if self.authority.is_authoritative(self.local, id) {
                continue;
            }
            if let Some(entity) = self.entities.get_mut(id) {
                if let Some(interp) = entity.remote {
                    let (pos, yaw) = interp.correct(entity.position, entity.yaw);
                    entity.position = pos;
                    entity.yaw = yaw;
                }
            }
        }
    }

    // ---- internals ----

    fn spawn_entity(
        &mut self,
        caster: PlayerId,
        def: &AbilityDef,
        position: Vec3,
        yaw: f32,
        curve: f32,
    ) -> EntityId {
        self.next_seq += 1;
        let id = EntityId::compose(self.local, self.next_seq);
        let now = self.tick;

        let state = match def.machine {
            MachineKind::Bolt => AbilityState::Bolt(abilities::bolt::BoltState),
            MachineKind::HomingChain => AbilityState::Homing(abilities::homing::HomingState::default()),
            MachineKind::Tether => AbilityState::Tether(abilities::tether::TetherState::default()),
            MachineKind::Ward => AbilityState::Ward(abilities::ward::WardState::default()),
            MachineKind::TeleportStrike => {
                let cast_ticks = def
                    .strike
                    .map_or(0, |s| secs_to_ticks(s.cast_time));
                AbilityState::Strike(strike::StrikeState::begin(now, cast_ticks, position))
            }
            MachineKind::Grapple => AbilityState::Grapple(abilities::grapple::GrappleState::default()),
        };

        let entity = AbilityEntity {
            id,
            ability: def.id,
            caster,
            position,
            yaw: math::wrap_yaw(yaw),
            speed: def.speed,
            curve,
            spawned_at: now,
            armed_at: now + secs_to_ticks(def.arming),
            death_deadline: now + secs_to_ticks(def.lifetime),
            lifecycle: Lifecycle::Alive,
            guard: HitGuard::new(),
            state,
            remote: None,
        };

        match def.machine {
            MachineKind::Ward => self.feed.subscribe_ward(caster, id),
            MachineKind::TeleportStrike => self.feed.subscribe_marks(caster, id),
            MachineKind::Tether => {
                self.tethers.insert((caster, def.slot), id);
            }
            _ => {}
        }
        tracing::debug!(entity = %id, ability = %def.name, tick = now, "Spawned ability entity");
        self.channel.publish(
            self.local,
            Scope::OthersOnly,
            id,
            EventKind::Spawned {
                ability: def.id,
                position,
                yaw,
                curve,
            },
        );
        self.entities.insert(entity);
        id
    }

    /// Run a closure over one entity with a full step context. The entity
    /// is taken out of the arena for the duration so the context can hold
    /// the session's other fields mutably.
    fn with_entity(
        &mut self,
        world: &mut dyn GameWorld,
        spatial: &SpatialIndex,
        id: EntityId,
        damage: &mut Vec<DamageNotice>,
        f: impl FnOnce(&mut StepCtx<'_>, &mut AbilityEntity),
    ) {
        let Some(mut entity) = self.entities.remove(id) else {
            return;
        };
        let Some(def) = self.catalog.get(entity.ability).cloned() else {
            tracing::warn!(entity = %id, ability = ?entity.ability, "Entity's ability vanished from catalog");
            if entity.begin_dying(self.tick + secs_to_ticks(1.0)) {
                self.feed.unsubscribe_all(id);
                self.channel
                    .publish(self.local, Scope::OthersOnly, id, EventKind::Died);
            }
            self.entities.insert(entity);
            return;
        };
        {
            let mut ctx = StepCtx {
                world,
                spatial,
                now: self.tick,
                def: &def,
                channel: &mut self.channel,
                feed: &mut self.feed,
                local: self.local,
                damage,
                follow_ups: &mut self.pending_follow_ups,
            };
            f(&mut ctx, &mut entity);
        }
        self.entities.insert(entity);
    }

    fn route_contact(
        &mut self,
        world: &mut dyn GameWorld,
        spatial: &SpatialIndex,
        contact: Contact,
        damage: &mut Vec<DamageNotice>,
    ) {
        let id = contact.entity;
        if !self.entities.contains(id) {
            tracing::debug!(entity = %id, "Contact for absent entity, ignoring");
            return;
        }
        match contact.phase {
            ContactPhase::End => {
                if let ContactKind::Unit(unit) = contact.kind {
                    if let Some(entity) = self.entities.get_mut(id) {
                        entity.guard.contact_ended(unit);
                    }
                }
            }
            ContactPhase::Begin => {
                if !self.authority.is_authoritative(self.local, id) {
                    return;
                }
                // Arming window: the caster cannot hit themselves in the
                // first instants after launch.
                if let ContactKind::Unit(unit) = contact.kind {
                    if let Some(entity) = self.entities.get(id) {
                        if self.tick < entity.armed_at
                            && world.unit_owner(unit) == Some(entity.caster)
                        {
                            return;
                        }
                    }
                }
                self.with_entity(world, spatial, id, damage, |ctx, entity| {
                    abilities::contact_machine(ctx, entity, contact.kind);
                });
                self.cleanup_if_dead(id);
            }
        }
    }

    /// Mirror free-run: integrate travel locally and honor the death
    /// timer, making no authoritative decisions.
    fn free_run(&mut self, id: EntityId) {
        let now = self.tick;
        let teardown = self
            .entities
            .get(id)
            .and_then(|e| self.catalog.get(e.ability))
            .map_or_else(|| secs_to_ticks(1.0), |d| secs_to_ticks(d.teardown));
        if let Some(entity) = self.entities.get_mut(id) {
            if entity.is_alive() {
                if entity.speed > 0.0 {
                    entity.yaw = math::wrap_yaw(entity.yaw + entity.curve);
                    entity.position += math::yaw_to_dir(entity.yaw) * entity.speed * TICK_SECONDS;
                }
                if now >= entity.death_deadline {
                    entity.begin_dying(now + teardown);
                }
            }
        }
    }

    /// Offer one damage occurrence to the subscribed wards and strikes.
    /// Subscriber lists are snapshotted first: a ward's reaction can tear
    /// down another subscriber in this same chain.
    fn dispatch_notice(
        &mut self,
        world: &mut dyn GameWorld,
        spatial: &SpatialIndex,
        notice: DamageNotice,
    ) {
        // Self-damage neither triggers wards nor accumulates marks.
        if notice.attacker == notice.victim {
            return;
        }

        let wards = self.feed.wards_for(notice.victim);
        let mut claimed = false;
        for ward_id in wards {
            if claimed {
                break;
            }
            if !self.authority.is_authoritative(self.local, ward_id) {
                continue;
            }
            let can = self.entities.get(ward_id).is_some_and(ward::can_claim);
            if can {
                let mut scratch = Vec::new();
                self.with_entity(world, spatial, ward_id, &mut scratch, |ctx, entity| {
                    ward::claim(ctx, entity, notice.attacker);
                });
                self.pending_notices.append(&mut scratch);
                claimed = true;
            }
        }

        for strike_id in self.feed.marks_for(notice.attacker) {
            if !self.authority.is_authoritative(self.local, strike_id) {
                continue;
            }
            if let Some(entity) = self.entities.get_mut(strike_id) {
                if strike::is_armed(entity) {
                    strike::accumulate(entity, notice.victim_unit, notice.amount);
                }
            }
        }
    }

    /// Release registries the moment an entity stops being alive.
    fn cleanup_if_dead(&mut self, id: EntityId) {
        let dead = self.entities.get(id).is_some_and(|e| !e.is_alive());
        if dead {
            self.tethers.retain(|_, &mut e| e != id);
        }
    }

    /// Direct teardown outside a machine step (cancellation paths).
    fn kill_entity(&mut self, id: EntityId) {
        let teardown = self
            .entities
            .get(id)
            .and_then(|e| self.catalog.get(e.ability))
            .map_or_else(|| secs_to_ticks(1.0), |d| secs_to_ticks(d.teardown));
        let now = self.tick;
        if let Some(entity) = self.entities.get_mut(id) {
            if entity.begin_dying(now + teardown) {
                self.feed.unsubscribe_all(id);
                self.tethers.retain(|_, &mut e| e != id);
                self.channel
                    .publish(self.local, Scope::OthersOnly, id, EventKind::Died);
            }
        }
    }

    /// Apply one admitted replication event. Events for absent entities
    /// no-op with a log line; handlers are idempotent against redelivery.
    #[allow(clippy::too_many_lines)]
    fn apply_event(&mut self, world: &mut dyn GameWorld, kind: &EventKind, id: EntityId) {
        let now = self.tick;

        if let EventKind::Spawned {
            ability,
            position,
            yaw,
            curve,
        } = kind
        {
            if self.entities.contains(id) {
                return; // duplicate spawn
            }
            let Some(def) = self.catalog.get(*ability).cloned() else {
                tracing::warn!(entity = %id, ability = ?ability, "Spawn event for unknown ability");
                return;
            };
            let state = match def.machine {
                MachineKind::Bolt => AbilityState::Bolt(abilities::bolt::BoltState),
                MachineKind::HomingChain => {
                    AbilityState::Homing(abilities::homing::HomingState::default())
                }
                MachineKind::Tether => AbilityState::Tether(abilities::tether::TetherState::default()),
                MachineKind::Ward => AbilityState::Ward(abilities::ward::WardState::default()),
                MachineKind::TeleportStrike => {
                    let cast_ticks = def.strike.map_or(0, |s| secs_to_ticks(s.cast_time));
                    AbilityState::Strike(strike::StrikeState::begin(now, cast_ticks, *position))
                }
                MachineKind::Grapple => {
                    AbilityState::Grapple(abilities::grapple::GrappleState::default())
                }
            };
            let mirror = AbilityEntity {
                id,
                ability: def.id,
                caster: id.owner(),
                position: *position,
                yaw: math::wrap_yaw(*yaw),
                speed: def.speed,
                curve: *curve,
                spawned_at: now,
                armed_at: now,
                death_deadline: now + secs_to_ticks(def.lifetime),
                lifecycle: Lifecycle::Alive,
                guard: HitGuard::new(),
                state,
                remote: Some(Interpolator::new()),
            };
            self.entities.insert(mirror);
            return;
        }

        if !self.entities.contains(id) {
            tracing::debug!(entity = %id, ?kind, "Event for absent entity, ignoring");
            return;
        }

        let teardown = self
            .entities
            .get(id)
            .and_then(|e| self.catalog.get(e.ability))
            .map_or_else(|| secs_to_ticks(1.0), |d| secs_to_ticks(d.teardown));
        let deflect_ticks = self
            .entities
            .get(id)
            .and_then(|e| self.catalog.get(e.ability))
            .and_then(|d| d.ward)
            .map_or(0, |w| secs_to_ticks(w.deflect_time));

        let Some(entity) = self.entities.get_mut(id) else {
            return;
        };

        match kind {
            EventKind::Spawned { .. } => unreachable!("handled above"),
            EventKind::Died => {
                if entity.begin_dying(now + teardown) {
                    self.feed.unsubscribe_all(id);
                    self.tethers.retain(|_, &mut e| e != id);
                }
            }
            EventKind::PositionSync { position, yaw } => {
                if let Some(interp) = entity.remote.as_mut() {
                    interp.observe(*position, *yaw);
                }
            }
            EventKind::Teleported { unit, position } => {
                if world.is_local_unit(*unit) {
                    world.set_unit_position(*unit, *position);
                }
                if let Some(interp) = entity.remote.as_mut() {
                    interp.reset();
                }
            }
            EventKind::Knockback { unit, force } => {
                if world.is_local_unit(*unit) {
                    world.add_unit_force(*unit, *force);
                }
            }
            EventKind::ThrowLaunched { unit, velocity } => {
                if world.is_local_unit(*unit) {
                    world.set_unit_velocity(*unit, *velocity);
                }
                if let AbilityState::Tether(s) = &mut entity.state {
                    s.phase = tether::TetherPhase::AwaitLanding {
                        unit: *unit,
                        airborne: false,
                        grace_until: now,
                    };
                }
            }
            EventKind::Hit { position, .. } => {
                entity.position = *position;
            }
            EventKind::Hooked { unit } => {
                if let AbilityState::Tether(s) = &mut entity.state {
                    s.phase = tether::TetherPhase::Hooked { unit: *unit };
                }
            }
            EventKind::PullTriggered => {
                if let AbilityState::Tether(s) = &mut entity.state {
                    if let tether::TetherPhase::Hooked { unit } = s.phase {
                        s.phase = tether::TetherPhase::Throwing {
                            unit,
                            launch_at: now,
                        };
                    }
                }
            }
            EventKind::Detached => {
                // The authoritative Died event follows; nothing to mirror.
            }
            EventKind::SurfaceAnchored { position } => {
                entity.position = *position;
                if let AbilityState::Tether(s) = &mut entity.state {
                    s.phase = tether::TetherPhase::Surface { anchor: *position };
                }
            }
            EventKind::SlamLanded { position } => {
                entity.position = *position;
            }
            EventKind::Stuck { anchor } => {
                if let AbilityState::Grapple(s) = &mut entity.state {
                    s.phase = abilities::grapple::GrapplePhase::Stuck {
                        anchor: *anchor,
                        detach_at: u64::MAX,
                        next_scan: u64::MAX,
                        candidate: None,
                    };
                }
            }
            EventKind::TargetPreview { candidate } => {
                if let AbilityState::Grapple(s) = &mut entity.state {
                    if let abilities::grapple::GrapplePhase::Stuck {
                        anchor,
                        detach_at,
                        next_scan,
                        ..
                    } = s.phase
                    {
                        s.phase = abilities::grapple::GrapplePhase::Stuck {
                            anchor,
                            detach_at,
                            next_scan,
                            candidate: *candidate,
                        };
                    }
                }
            }
            EventKind::Chained { first, second } => {
                if let AbilityState::Grapple(s) = &mut entity.state {
                    s.phase = abilities::grapple::GrapplePhase::Chained {
                        first: *first,
                        second: *second,
                        until: u64::MAX,
                    };
                }
            }
            EventKind::Detonated {
                position,
                first,
                second,
            } => {
                entity.position = *position;
                for unit in [*first, *second] {
                    if world.is_local_unit(unit) {
                        world.set_unit_velocity(unit, Vec3::ZERO);
                    }
                }
            }
            EventKind::WardDeflect { attacker } => {
                if let AbilityState::Ward(s) = &mut entity.state {
                    s.phase = ward::WardPhase::Deflecting {
                        attacker: *attacker,
                        arrive_at: now + deflect_ticks,
                    };
                }
            }
            EventKind::WardBlock { attacker_unit } => {
                if let AbilityState::Ward(s) = &mut entity.state {
                    s.phase = ward::WardPhase::Blocking {
                        attacker_unit: *attacker_unit,
                        until: u64::MAX,
                    };
                }
            }
            EventKind::StrikeStep { position, .. } => {
                entity.position = *position;
                if let Some(interp) = entity.remote.as_mut() {
                    interp.reset();
                }
            }
        }
    }
}
