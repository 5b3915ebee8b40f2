//! # Brawl Core
//!
//! Owner-authoritative ability simulation for a real-time multiplayer
//! brawler. Each cast spawns an ability entity - projectile, tether, ward,
//! teleport strike - that one peer simulates authoritatively while every
//! other peer mirrors it from replicated transitions and position snapshots.
//!
//! The crate contains **only** simulation logic:
//! - No rendering, audio, or UI
//! - No rigid-body integration (consumed through [`world::GameWorld`])
//! - No transport implementation (consumed through `brawl_net`)
//!
//! ## Crate Structure
//!
//! - [`session`] - the per-peer arena and fixed-tick loop
//! - [`abilities`] - the six ability state machines
//! - [`catalog`] - ability definitions and the registration surface
//! - [`spatial`] - radius and nearest-unit queries
//! - [`hit`] - area-effect resolution and the hit-once guard
//! - [`notify`] - the per-player damage-notification feed
//! - [`math`] - headings, shortest-arc steering, spring forces

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod abilities;
pub mod catalog;
pub mod entity;
pub mod error;
pub mod hit;
pub mod math;
pub mod notify;
pub mod session;
pub mod spatial;
pub mod world;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::catalog::{AbilityCatalog, AbilityDef, AbilitySlot, MachineKind};
    pub use crate::entity::{AbilityEntity, EntityStorage, Lifecycle};
    pub use crate::error::{EngineError, Result};
    pub use crate::math::SpringProfile;
    pub use crate::session::{CastOutcome, CastParams, Contact, ContactKind, Session, TickEvents};
    pub use crate::spatial::SpatialIndex;
    pub use crate::world::{CauseTag, GameWorld, UnitKind};
    pub use brawl_net::{AbilityId, EntityId, PlayerId, UnitId};
    pub use glam::Vec3;
}
