//! Ward: a shield that waits for its protected player to take damage, then
//! flies at the attacker and holds them.
//!
//! Wards subscribe to the damage feed by victim. When a notice arrives the
//! session offers it to that victim's wards in snapshot order; the first
//! one still catching claims the attacker, and the claim latch in the
//! dispatch loop stops a second ward reacting to the same occurrence.

use brawl_net::{EventKind, PlayerId, UnitId};
use glam::Vec3;

use crate::entity::AbilityEntity;
use crate::session::secs_to_ticks;

use super::{apply_single_damage, die, StepCtx};

/// Where the ward is in its reaction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WardPhase {
    /// Shadowing the protected player, waiting for incoming damage.
    Catching,
    /// Flying at the claimed attacker.
    Deflecting {
        /// The claimed attacker.
        attacker: PlayerId,
        /// Arrival tick (fixed flight time).
        arrive_at: u64,
    },
    /// Holding the attacker with the block spring.
    Blocking {
        /// The held unit.
        attacker_unit: UnitId,
        /// End of the block window.
        until: u64,
    },
}

/// Ward machine state.
#[derive(Debug, Clone, Copy)]
pub struct WardState {
    /// Current phase.
    pub phase: WardPhase,
}

impl Default for WardState {
    fn default() -> Self {
        Self {
            phase: WardPhase::Catching,
        }
    }
}

fn state(entity: &mut AbilityEntity) -> &mut WardState {
    match &mut entity.state {
        super::AbilityState::Ward(s) => s,
        _ => unreachable!("ward step on non-ward entity"),
    }
}

/// Whether this ward can claim an attacker right now.
#[must_use]
pub fn can_claim(entity: &AbilityEntity) -> bool {
    entity.is_alive()
        && matches!(
            entity.state,
            super::AbilityState::Ward(WardState {
                phase: WardPhase::Catching
            })
        )
}

/// Claim an attacker: leave the catch phase and start the deflect flight.
/// The catch-window expiry no longer applies; the deadline stretches to
/// cover the flight plus the block window.
pub fn claim(ctx: &mut StepCtx<'_>, entity: &mut AbilityEntity, attacker: PlayerId) {
    let params = ctx.def.ward.expect("ward entity without ward params");
    state(entity).phase = WardPhase::Deflecting {
        attacker,
        arrive_at: ctx.now + secs_to_ticks(params.deflect_time),
    };
    entity.death_deadline = ctx.now + secs_to_ticks(params.deflect_time + params.block_window);
    ctx.publish(entity.id, EventKind::WardDeflect { attacker });
}

/// One authoritative tick.
pub fn step(ctx: &mut StepCtx<'_>, entity: &mut AbilityEntity) {
    if !entity.is_alive() {
        return;
    }
    let params = ctx.def.ward.expect("ward entity without ward params");

    let phase = state(entity).phase;
    match phase {
        WardPhase::Catching => {
            // Shadow the protected player; expiry is the shared death
            // timer, set to the catch window at spawn.
            if let Some(unit) = ctx.world.caster_unit(entity.caster) {
                if let Some(pos) = ctx.world.unit_position(unit) {
                    entity.position = pos;
                }
            }
        }
        WardPhase::Deflecting { attacker, arrive_at } => {
            let Some(attacker_unit) = ctx.world.caster_unit(attacker) else {
                die(ctx, entity);
                return;
            };
            let Some(attacker_pos) = ctx.world.unit_position(attacker_unit) else {
                die(ctx, entity);
                return;
            };
            if ctx.now < arrive_at {
                // Fixed flight time: close the remaining gap evenly.
                let remaining = (arrive_at - ctx.now) as f32;
                entity.position += (attacker_pos - entity.position) / remaining.max(1.0);
                return;
            }
            // One counter tick plus knockback on arrival, then the spring
            // holds them for the block window. Knockback pushes the
            // attacker away from the protected player.
            let origin = ctx
                .world
                .caster_unit(entity.caster)
                .and_then(|u| ctx.world.unit_position(u))
                .unwrap_or(entity.position);
            let away = attacker_pos - origin;
            entity.position = attacker_pos;
            apply_single_damage(ctx, entity, attacker_unit, ctx.def.damage);
            let dir = if away.length_squared() > f32::EPSILON {
                away.normalize()
            } else {
                Vec3::Y
            };
            ctx.apply_force(entity.id, attacker_unit, dir * params.counter_knockback);
            state(entity).phase = WardPhase::Blocking {
                attacker_unit,
                until: ctx.now + secs_to_ticks(params.block_window),
            };
            ctx.publish(entity.id, EventKind::WardBlock { attacker_unit });
        }
        WardPhase::Blocking {
            attacker_unit,
            until,
        } => {
            if ctx.now >= until {
                die(ctx, entity);
                return;
            }
            let Some(unit_pos) = ctx.spatial.position_of(attacker_unit) else {
                die(ctx, entity);
                return;
            };
            let force = params.spring.pull(unit_pos, entity.position);
            if force != Vec3::ZERO {
                ctx.apply_force(entity.id, attacker_unit, force);
            }
        }
    }
}
