//! Grapple: stick to one unit, chain it to a second, detonate at the
//! midpoint.
//!
//! While stuck the machine rides its anchor and rescans on a fixed cadence
//! for the nearest other unit, publishing a preview event whenever the
//! candidate changes so remote HUDs can show who is about to be chained.
//! With no second unit at detach time it dies without detonating.

use brawl_net::{EventKind, UnitId};
use glam::Vec3;

use crate::entity::AbilityEntity;
use crate::hit::HitDecision;
use crate::session::secs_to_ticks;
use crate::spatial::Filter;
use crate::world::UnitKind;

use super::{die, resolve_area, travel, StepCtx};

/// Where the grapple is in its life.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GrapplePhase {
    /// Travelling toward its first target.
    Flying,
    /// Anchored to the first unit, scanning for a second.
    Stuck {
        /// The anchor unit.
        anchor: UnitId,
        /// Detach tick.
        detach_at: u64,
        /// Next rescan tick.
        next_scan: u64,
        /// Current second-target candidate.
        candidate: Option<UnitId>,
    },
    /// Between detach and the chain pull starting.
    Jump {
        /// The anchor unit.
        anchor: UnitId,
        /// The chained second unit.
        second: UnitId,
        /// Tick the pull starts.
        pull_at: u64,
    },
    /// Pulling both units together until they meet or the window closes.
    Chained {
        /// The anchor unit.
        first: UnitId,
        /// The chained second unit.
        second: UnitId,
        /// Give-up tick.
        until: u64,
    },
}

/// Grapple machine state.
#[derive(Debug, Clone, Copy)]
pub struct GrappleState {
    /// Current phase.
    pub phase: GrapplePhase,
}

impl Default for GrappleState {
    fn default() -> Self {
        Self {
            phase: GrapplePhase::Flying,
        }
    }
}

fn state(entity: &mut AbilityEntity) -> &mut GrappleState {
    match &mut entity.state {
        super::AbilityState::Grapple(s) => s,
        _ => unreachable!("grapple step on non-grapple entity"),
    }
}

/// One authoritative tick.
pub fn step(ctx: &mut StepCtx<'_>, entity: &mut AbilityEntity) {
    if !entity.is_alive() {
        travel(entity, ctx.def.decel);
        return;
    }
    let params = ctx
        .def
        .grapple
        .expect("grapple entity without grapple params");

    let phase = state(entity).phase;
    match phase {
        GrapplePhase::Flying => {
            travel(entity, ctx.def.accel);
            for unit in entity.guard.take_deferred(ctx.now) {
                on_unit_contact(ctx, entity, unit);
            }
        }
        GrapplePhase::Stuck {
            anchor,
            detach_at,
            next_scan,
            candidate,
        } => {
            let Some(anchor_pos) = ctx.spatial.position_of(anchor) else {
                die(ctx, entity);
                return;
            };
            entity.position = anchor_pos;

            let mut candidate = candidate;
            let mut next_scan = next_scan;
            if ctx.now >= next_scan {
                let filter = Filter::default()
                    .without_owner(entity.caster)
                    .without_unit(anchor)
                    .without_kind(UnitKind::Crystal);
                let found = ctx
                    .spatial
                    .nearest_within(anchor_pos, params.scan_radius, &filter);
                if found != candidate {
                    candidate = found;
                    ctx.publish(entity.id, EventKind::TargetPreview { candidate });
                }
                next_scan = ctx.now + secs_to_ticks(params.scan_interval);
            }

            if ctx.now >= detach_at {
                match candidate {
                    Some(second) => {
                        state(entity).phase = GrapplePhase::Jump {
                            anchor,
                            second,
                            pull_at: ctx.now + secs_to_ticks(params.jump_delay),
                        };
                        ctx.publish(entity.id, EventKind::Detached);
                    }
                    None => {
                        // Nobody to chain: the grapple just falls off.
                        die(ctx, entity);
                    }
                }
            } else {
                state(entity).phase = GrapplePhase::Stuck {
                    anchor,
                    detach_at,
                    next_scan,
                    candidate,
                };
            }
        }
        GrapplePhase::Jump {
            anchor,
            second,
            pull_at,
        } => {
            if ctx.now >= pull_at {
                state(entity).phase = GrapplePhase::Chained {
                    first: anchor,
                    second,
                    until: ctx.now + secs_to_ticks(params.chain_window),
                };
                ctx.publish(
                    entity.id,
                    EventKind::Chained {
                        first: anchor,
                        second,
                    },
                );
            }
        }
        GrapplePhase::Chained {
            first,
            second,
            until,
        } => {
            if ctx.now >= until {
                die(ctx, entity);
                return;
            }
            let (Some(first_pos), Some(second_pos)) = (
                ctx.world.unit_position(first),
                ctx.world.unit_position(second),
            ) else {
                die(ctx, entity);
                return;
            };

            let separation_sq = first_pos.distance_squared(second_pos);
            let midpoint = (first_pos + second_pos) * 0.5;
            if separation_sq < params.detonate_distance * params.detonate_distance {
                detonate(ctx, entity, first, second, midpoint);
                return;
            }

            // Pull both toward each other, damping their velocity so the
            // spring converges instead of oscillating.
            for (unit, other_pos) in [(first, second_pos), (second, first_pos)] {
                if let Some(pos) = ctx.world.unit_position(unit) {
                    let delta = other_pos - pos;
                    if delta.length_squared() > f32::EPSILON {
                        ctx.apply_force(entity.id, unit, delta.normalize() * params.chain_power);
                    }
                    if ctx.world.is_local_unit(unit) {
                        if let Some(v) = ctx.world.unit_velocity(unit) {
                            ctx.world.set_unit_velocity(unit, v * params.damping);
                        }
                    }
                }
            }
            entity.position = entity.position.lerp(midpoint, 0.1);
        }
    }
}

fn detonate(
    ctx: &mut StepCtx<'_>,
    entity: &mut AbilityEntity,
    first: UnitId,
    second: UnitId,
    midpoint: Vec3,
) {
    for unit in [first, second] {
        if ctx.world.is_local_unit(unit) {
            ctx.world.set_unit_velocity(unit, Vec3::ZERO);
        }
    }
    entity.position = midpoint;
    // Both chained units take full damage but no launch: their velocity is
    // zeroed by the owning peers and stays zeroed. Only bystanders in the
    // radius take splash and knockback.
    super::apply_single_damage(ctx, entity, first, ctx.def.damage);
    super::apply_single_damage(ctx, entity, second, ctx.def.damage);
    resolve_area(
        ctx,
        entity,
        midpoint,
        None,
        ctx.def.damage,
        ctx.def.power,
        Filter::default().without_unit(first).without_unit(second),
    );
    ctx.publish(
        entity.id,
        EventKind::Detonated {
            position: midpoint,
            first,
            second,
        },
    );
    die(ctx, entity);
}

/// First unit contact: anchor to it with a token damage tick.
pub fn on_unit_contact(ctx: &mut StepCtx<'_>, entity: &mut AbilityEntity, unit: UnitId) {
    if !entity.is_alive() || state(entity).phase != GrapplePhase::Flying {
        return;
    }
    match entity.guard.offer(unit, ctx.now) {
        HitDecision::Hit => {}
        HitDecision::Deferred | HitDecision::AlreadyHit => return,
    }
    let params = ctx
        .def
        .grapple
        .expect("grapple entity without grapple params");
    super::apply_single_damage(ctx, entity, unit, 1.0);
    entity.death_deadline = ctx.now + secs_to_ticks(params.stick_timeout) + secs_to_ticks(params.chain_window);
    state(entity).phase = GrapplePhase::Stuck {
        anchor: unit,
        detach_at: ctx.now + secs_to_ticks(params.stick_timeout),
        next_scan: ctx.now,
        candidate: None,
    };
    ctx.publish(entity.id, EventKind::Stuck { anchor: unit });
}

/// Terrain contact stops the grapple.
pub fn on_surface_contact(ctx: &mut StepCtx<'_>, entity: &mut AbilityEntity) {
    if entity.is_alive() && state(entity).phase == GrapplePhase::Flying {
        die(ctx, entity);
    }
}
