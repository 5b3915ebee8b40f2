//! Per-entity event sequencing, wire framing, and the receive-side guard.
//!
//! The sender assigns a monotone sequence number per entity at emission;
//! the receiver's [`Inbox`] drops anything at or below the last applied
//! sequence. Delivery is at-least-once, so duplicates are normal and every
//! downstream handler must be idempotent - the inbox makes that cheap by
//! absorbing the common case before handlers run.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{NetError, Result};
use crate::event::{EventKind, ReplicationEvent, Scope};
use crate::ids::{EntityId, PlayerId};

/// A framed event plus its addressing, as it travels on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// The peer that published the event.
    pub sender: PlayerId,
    /// Addressing for relay nodes; receivers outside the scope drop it.
    pub scope: Scope,
    /// The event itself.
    pub event: ReplicationEvent,
}

impl Frame {
    /// Encode for transmission.
    pub fn encode(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| NetError::EncodeError(e.to_string()))
    }

    /// Decode a received frame.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes).map_err(|e| NetError::DecodeError(e.to_string()))
    }

    /// Whether a frame addressed with `scope` should be applied by `local`.
    #[must_use]
    pub fn addressed_to(&self, local: PlayerId) -> bool {
        match self.scope {
            Scope::All => true,
            Scope::OthersOnly => self.sender != local,
            Scope::Peer(p) => p == local,
        }
    }
}

/// Send side: assigns per-entity sequence numbers and queues frames.
#[derive(Debug, Default)]
pub struct EventChannel {
    next_seq: HashMap<EntityId, u32>,
    queued: Vec<Frame>,
}

impl EventChannel {
    /// Create an empty channel.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish an event: stamp the next sequence number for its entity and
    /// queue the frame.
    pub fn publish(&mut self, sender: PlayerId, scope: Scope, entity: EntityId, kind: EventKind) {
        let seq = self.next_seq.entry(entity).or_insert(0);
        *seq += 1;
        self.queued.push(Frame {
            sender,
            scope,
            event: ReplicationEvent {
                entity,
                seq: *seq,
                kind,
            },
        });
    }

    /// Take everything queued since the last drain.
    #[must_use]
    pub fn drain(&mut self) -> Vec<Frame> {
        std::mem::take(&mut self.queued)
    }

    /// Forget sequencing state for a destroyed entity.
    pub fn forget(&mut self, entity: EntityId) {
        self.next_seq.remove(&entity);
    }
}

/// Receive side: per-entity duplicate and reorder guard.
#[derive(Debug, Default)]
pub struct Inbox {
    last_applied: HashMap<EntityId, u32>,
}

impl Inbox {
    /// Create an empty inbox.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit an event if it is new for its entity. Returns `false` for
    /// duplicates and stale reorders, which the caller must drop.
    pub fn admit(&mut self, event: &ReplicationEvent) -> bool {
        let last = self.last_applied.entry(event.entity).or_insert(0);
        if event.seq <= *last {
            tracing::debug!(
                entity = %event.entity,
                seq = event.seq,
                last = *last,
                "Dropping duplicate or stale event"
            );
            return false;
        }
        *last = event.seq;
        true
    }

    /// Forget a destroyed entity so a reused id (never expected, but cheap
    /// to tolerate) starts fresh.
    pub fn forget(&mut self, entity: EntityId) {
        self.last_applied.remove(&entity);
    }
}
