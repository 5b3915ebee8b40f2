//! Two connected sessions over an in-process loopback.
//!
//! Both sides share one scripted world so assertions can watch the same
//! units the machines act on; what differs per side is which units each
//! session considers locally simulated - tests flip [`StubUnit::local`]
//! per world when that distinction matters.

use brawl_core::prelude::*;
use brawl_net::LocalLoopbackTransport;

use crate::world::StubWorld;

/// Two sessions wired together through a loopback transport.
pub struct PeerPair {
    /// Session for the first player.
    pub a: Session,
    /// Session for the second player.
    pub b: Session,
    /// World as the first player's process sees it.
    pub world_a: StubWorld,
    /// World as the second player's process sees it.
    pub world_b: StubWorld,
    transport_a: LocalLoopbackTransport,
    transport_b: LocalLoopbackTransport,
}

impl PeerPair {
    /// Two connected peers (players 1 and 2) over `catalog`, with cloned
    /// copies of `world` on each side.
    #[must_use]
    pub fn new(catalog: AbilityCatalog, world: &StubWorld) -> Self {
        let peers = [PlayerId(1), PlayerId(2)];
        let (transport_a, transport_b) = LocalLoopbackTransport::pair();
        Self {
            a: Session::new(PlayerId(1), catalog.clone(), peers),
            b: Session::new(PlayerId(2), catalog, peers),
            world_a: world.clone(),
            world_b: world.clone(),
            transport_a,
            transport_b,
        }
    }

    /// Tick both sessions once with per-side contacts, then exchange and
    /// apply all replication frames.
    pub fn tick(&mut self, contacts_a: &[Contact], contacts_b: &[Contact]) -> (TickEvents, TickEvents) {
        let ev_a = self.a.tick(&mut self.world_a, contacts_a);
        let ev_b = self.b.tick(&mut self.world_b, contacts_b);
        self.exchange();
        (ev_a, ev_b)
    }

    /// Flush both outboxes and pump both inboxes.
    pub fn exchange(&mut self) {
        self.a.flush(&self.transport_a);
        self.b.flush(&self.transport_b);
        self.a.pump(&mut self.world_a, &self.transport_a);
        self.b.pump(&mut self.world_b, &self.transport_b);
    }

    /// Run `n` quiet ticks (no contacts) with frame exchange.
    pub fn run(&mut self, n: u64) {
        for _ in 0..n {
            self.tick(&[], &[]);
        }
    }
}
