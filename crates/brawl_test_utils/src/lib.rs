//! # Brawl Test Utilities
//!
//! Shared testing utilities for all crates:
//! - A stub [`brawl_core::world::GameWorld`] with scripted units
//! - A two-peer loopback harness for replication scenarios
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod loopback;
pub mod world;

pub use loopback::PeerPair;
pub use world::{StubUnit, StubWorld};

/// Re-export proptest for convenience.
pub use proptest;

/// Install a test subscriber honoring `RUST_LOG`. Safe to call from every
/// test; only the first call wins.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
