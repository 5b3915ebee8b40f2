//! Ability definitions and the registration surface.
//!
//! Definitions are static data: slot, machine kind, and the numeric
//! parameters each machine reads. Runtime state lives on the entity, never
//! here. The shipped defaults are embedded as RON and loaded with
//! [`AbilityCatalog::load_default`]; an embedder can also register its own
//! table. Registration is idempotent so a hot-reloaded module can re-register
//! everything without disturbing in-flight entities.

use std::collections::HashMap;

use brawl_net::AbilityId;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::math::SpringProfile;

/// The loadout slot an ability occupies. One live tether per
/// (caster, slot) is enforced by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbilitySlot {
    /// Main attack.
    Primary,
    /// Second attack.
    Secondary,
    /// Mobility cast.
    Movement,
    /// Defensive cast.
    Defensive,
    /// Utility cast.
    Utility,
    /// Once-a-fight cast.
    Ultimate,
}

/// Which state machine an ability runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MachineKind {
    /// Straight projectile, area hit.
    Bolt,
    /// Projectile that retargets after its first hit.
    HomingChain,
    /// Caster-launched hook with spring pull and throw.
    Tether,
    /// Damage-reactive shield.
    Ward,
    /// Mark-and-teleport execution chain.
    TeleportStrike,
    /// Stick, chain a second unit, detonate.
    Grapple,
}

/// Homing-chain tunables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HomingParams {
    /// Retarget scan radius after the first hit.
    pub retarget_radius: f32,
    /// Initial turn step, degrees per tick.
    pub turn_rate: f32,
    /// Per-tick multiplier on the turn step.
    pub turn_accel: f32,
    /// Seconds added to the death timer on the first hit.
    pub extend: f32,
}

/// Tether tunables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TetherParams {
    /// Pull curve toward the anchor.
    pub spring: SpringProfile,
    /// Seconds a hooked unit stays hooked before the tether dies.
    pub hook_duration: f32,
    /// Seconds between the throw recast and the launch.
    pub throw_delay: f32,
    /// Throw speed per metre of caster-target separation.
    pub throw_multiplier: f32,
    /// Upward component of the throw velocity.
    pub throw_lift: f32,
    /// Area damage where the thrown unit lands.
    pub slam_damage: f32,
    /// Seconds after the throw before a landing can register.
    pub land_grace: f32,
    /// Recast curve magnitude above which the recast detaches instead of
    /// pulling.
    pub detach_curve: f32,
}

/// Ward tunables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WardParams {
    /// Seconds the ward waits for incoming damage before expiring.
    pub catch_window: f32,
    /// Fixed flight time to the claimed attacker.
    pub deflect_time: f32,
    /// Seconds the attacker is held by the block spring.
    pub block_window: f32,
    /// Impulse applied to the attacker on arrival.
    pub counter_knockback: f32,
    /// Hold curve during the block window.
    pub spring: SpringProfile,
}

/// Teleport-strike tunables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrikeParams {
    /// Fixed cast time before the armed window opens.
    pub cast_time: f32,
    /// Seconds of mark accumulation.
    pub wait_window: f32,
    /// Seconds between the armed window closing and the first step.
    pub windup: f32,
    /// Seconds between attack steps.
    pub step_interval: f32,
    /// Seconds of recovery after the last step.
    pub winddown: f32,
    /// Absolute cap on the whole sequence, armed window included.
    pub hard_deadline: f32,
    /// How far short of the target each teleport lands.
    pub strike_offset: f32,
    /// Cast curve magnitude above which the caster returns to the start
    /// position after the last step.
    pub return_curve: f32,
}

/// Grapple tunables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GrappleParams {
    /// Seconds stuck to the anchor before detaching.
    pub stick_timeout: f32,
    /// Seconds between second-target rescans while stuck.
    pub scan_interval: f32,
    /// Second-target scan radius.
    pub scan_radius: f32,
    /// Seconds between detach and the chain pull starting.
    pub jump_delay: f32,
    /// Max seconds of chained pulling before giving up.
    pub chain_window: f32,
    /// Pull force applied to each chained unit.
    pub chain_power: f32,
    /// Per-tick velocity damping on chained units.
    pub damping: f32,
    /// Separation below which the pair detonates.
    pub detonate_distance: f32,
}

/// One ability's static definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilityDef {
    /// Stable identifier, referenced by casts and follow-ups.
    pub id: AbilityId,
    /// Display name.
    pub name: String,
    /// Loadout slot.
    pub slot: AbilitySlot,
    /// State machine.
    pub machine: MachineKind,
    /// Full damage to the primary target.
    pub damage: f32,
    /// Fraction of full damage dealt to non-primary units in the area.
    pub splash_fraction: f32,
    /// Area-effect radius.
    pub radius: f32,
    /// Knockback impulse scale.
    pub power: f32,
    /// Travel speed, metres per second.
    pub speed: f32,
    /// Per-tick speed multiplier while alive.
    pub accel: f32,
    /// Per-tick speed multiplier while dying.
    pub decel: f32,
    /// Seconds from spawn to the death timer.
    pub lifetime: f32,
    /// Teardown grace, seconds between dying and destruction.
    pub teardown: f32,
    /// Recast cooldown, seconds.
    pub cooldown: f32,
    /// Seconds after spawn during which caster contacts are ignored.
    pub arming: f32,
    /// Seconds after a hit during which further hits are deferred.
    pub hit_grace: f32,
    /// Ability cast at a strike destination or bolt impact, if any.
    pub follow_up: Option<AbilityId>,
    /// Present iff `machine` is [`MachineKind::HomingChain`].
    pub homing: Option<HomingParams>,
    /// Present iff `machine` is [`MachineKind::Tether`].
    pub tether: Option<TetherParams>,
    /// Present iff `machine` is [`MachineKind::Ward`].
    pub ward: Option<WardParams>,
    /// Present iff `machine` is [`MachineKind::TeleportStrike`].
    pub strike: Option<StrikeParams>,
    /// Present iff `machine` is [`MachineKind::Grapple`].
    pub grapple: Option<GrappleParams>,
}

/// Registered ability definitions.
#[derive(Debug, Clone, Default)]
pub struct AbilityCatalog {
    defs: HashMap<AbilityId, AbilityDef>,
}

impl AbilityCatalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the embedded default table.
    pub fn load_default() -> Result<Self> {
        let defs: Vec<AbilityDef> =
            ron::from_str(include_str!("../data/abilities.ron")).map_err(|e| {
                EngineError::DataParseError {
                    path: "data/abilities.ron".to_string(),
                    message: e.to_string(),
                }
            })?;
        let mut catalog = Self::new();
        for def in defs {
            catalog.register(def)?;
        }
        Ok(catalog)
    }

    /// Register a definition. The machine kind must come with its parameter
    /// block; a mismatched definition is rejected rather than stored, so the
    /// machines can rely on their params being present.
    ///
    /// Registering an id twice replaces the numbers and leaves in-flight
    /// entities running under the same id; the session re-resolves the
    /// definition every tick, so a reload takes effect immediately.
    pub fn register(&mut self, def: AbilityDef) -> Result<()> {
        let params_present = match def.machine {
            MachineKind::Bolt => true,
            MachineKind::HomingChain => def.homing.is_some(),
            MachineKind::Tether => def.tether.is_some(),
            MachineKind::Ward => def.ward.is_some(),
            MachineKind::TeleportStrike => def.strike.is_some(),
            MachineKind::Grapple => def.grapple.is_some(),
        };
        if !params_present {
            return Err(EngineError::InvalidDefinition {
                ability: def.id,
                message: format!("machine {:?} requires its parameter block", def.machine),
            });
        }
        if self.defs.insert(def.id, def.clone()).is_some() {
            tracing::debug!(ability = ?def.id, name = %def.name, "Re-registered ability");
        }
        Ok(())
    }

    /// Look up a definition.
    #[must_use]
    pub fn get(&self, id: AbilityId) -> Option<&AbilityDef> {
        self.defs.get(&id)
    }

    /// Number of registered abilities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}
