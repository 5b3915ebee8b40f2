//! Byte transport abstraction.
//!
//! The engine never blocks on the network: frames are fire-and-forget, and
//! receive is a non-blocking poll drained once per tick. The only shipped
//! implementation is an in-process loopback pair used by tests and local
//! play; real transports implement [`Transport`] outside this workspace.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;

/// Minimal non-blocking transport for replication frames.
pub trait Transport {
    /// Queue a frame for the remote side. Failure means the peer is gone;
    /// the caller logs and moves on, it never retries in the tick loop.
    fn try_send(&self, bytes: Vec<u8>) -> bool;

    /// Non-blocking receive of a single frame.
    fn try_recv(&self) -> Option<Vec<u8>>;

    /// Drain all currently queued frames.
    fn drain(&self) -> Vec<Vec<u8>> {
        let mut out = Vec::new();
        while let Some(b) = self.try_recv() {
            out.push(b);
        }
        out
    }
}

/// In-process loopback built on `std::sync::mpsc`.
pub struct LocalLoopbackTransport {
    tx: Sender<Vec<u8>>,
    rx: Mutex<Receiver<Vec<u8>>>,
}

impl LocalLoopbackTransport {
    /// Create a connected pair; what one side sends the other receives.
    #[must_use]
    pub fn pair() -> (Self, Self) {
        let (tx_a, rx_a) = mpsc::channel();
        let (tx_b, rx_b) = mpsc::channel();
        let a = Self {
            tx: tx_a,
            rx: Mutex::new(rx_b),
        };
        let b = Self {
            tx: tx_b,
            rx: Mutex::new(rx_a),
        };
        (a, b)
    }
}

impl Transport for LocalLoopbackTransport {
    fn try_send(&self, bytes: Vec<u8>) -> bool {
        self.tx.send(bytes).is_ok()
    }

    fn try_recv(&self) -> Option<Vec<u8>> {
        self.rx.lock().ok()?.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loopback_send_recv() {
        let (a, b) = LocalLoopbackTransport::pair();
        assert!(a.try_send(b"ping".to_vec()));
        assert!(b.try_send(b"pong".to_vec()));
        assert_eq!(b.try_recv(), Some(b"ping".to_vec()));
        assert_eq!(a.try_recv(), Some(b"pong".to_vec()));
    }

    #[test]
    fn drain_empties_the_queue() {
        let (a, b) = LocalLoopbackTransport::pair();
        assert!(a.try_send(vec![1]));
        assert!(a.try_send(vec![2]));
        let drained = b.drain();
        assert_eq!(drained, vec![vec![1], vec![2]]);
        assert!(b.try_recv().is_none());
    }
}
