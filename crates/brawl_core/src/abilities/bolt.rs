//! Plain bolt: straight flight, one area hit, done.
//!
//! The simplest instantiation of the common travel shape. Also cast as a
//! follow-up by other machines, which is why it tolerates spawning at an
//! arbitrary position with no caster nearby.

use brawl_net::{EventKind, UnitId};

use crate::entity::AbilityEntity;
use crate::hit::HitDecision;
use crate::session::secs_to_ticks;
use crate::spatial::Filter;

use super::{die, resolve_area, travel, StepCtx};

/// Bolts carry no machine state beyond the shared travel fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoltState;

/// One authoritative tick.
pub fn step(ctx: &mut StepCtx<'_>, entity: &mut AbilityEntity) {
    if entity.is_alive() {
        travel(entity, ctx.def.accel);
        for unit in entity.guard.take_deferred(ctx.now) {
            on_unit_contact(ctx, entity, unit);
        }
    } else {
        // Dying bolts keep drifting, decelerating, until teardown.
        travel(entity, ctx.def.decel);
    }
}

/// First valid unit contact: area effect centred on the bolt, full damage
/// to the struck unit, then teardown.
pub fn on_unit_contact(ctx: &mut StepCtx<'_>, entity: &mut AbilityEntity, unit: UnitId) {
    if !entity.is_alive() {
        return;
    }
    match entity.guard.offer(unit, ctx.now) {
        HitDecision::Hit => {}
        HitDecision::Deferred | HitDecision::AlreadyHit => return,
    }
    detonate(ctx, entity, Some(unit));
}

/// Terrain contact detonates too, with no primary target.
pub fn on_surface_contact(ctx: &mut StepCtx<'_>, entity: &mut AbilityEntity) {
    if !entity.is_alive() {
        return;
    }
    detonate(ctx, entity, None);
}

fn detonate(ctx: &mut StepCtx<'_>, entity: &mut AbilityEntity, primary: Option<UnitId>) {
    resolve_area(
        ctx,
        entity,
        entity.position,
        primary,
        ctx.def.damage,
        ctx.def.power,
        Filter::default(),
    );
    entity.guard.hold_until(ctx.now + secs_to_ticks(ctx.def.hit_grace));
    ctx.publish(
        entity.id,
        EventKind::Hit {
            target: primary,
            position: entity.position,
        },
    );
    if let Some(follow_up) = ctx.def.follow_up {
        ctx.follow_ups.push(super::FollowUp {
            ability: follow_up,
            caster: entity.caster,
            position: entity.position,
            yaw: entity.yaw,
        });
    }
    die(ctx, entity);
}
