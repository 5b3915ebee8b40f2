//! # Brawl Net
//!
//! Replication layer for the ability-simulation engine.
//!
//! Each ability entity is simulated by exactly one authoritative peer; this
//! crate carries its discrete state transitions to every other peer:
//! - [`event`] - replication event model (entity, sequence, kind, scope)
//! - [`channel`] - per-entity sequencing, wire framing, and the receive-side
//!   ordering/duplicate guard
//! - [`authority`] - who simulates what, including host failover
//! - [`snapshot`] - position snapshots and mirror-side interpolation
//! - [`transport`] - byte transport trait plus an in-process loopback
//!
//! Delivery is at-least-once: senders may retransmit, and the [`channel`]
//! inbox absorbs duplicates so handlers stay idempotent. Ordering is
//! guaranteed per entity only, never across entities.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod authority;
pub mod channel;
pub mod error;
pub mod event;
pub mod ids;
pub mod snapshot;
pub mod transport;

pub use authority::AuthorityMap;
pub use channel::{EventChannel, Frame, Inbox};
pub use error::{NetError, Result};
pub use event::{EventKind, ReplicationEvent, Scope};
pub use ids::{AbilityId, EntityId, PlayerId, UnitId};
pub use snapshot::Interpolator;
pub use transport::{LocalLoopbackTransport, Transport};
