//! Session identifier allocation.
//!
//! Session-correlated commands carry a 16-bit identifier the gateway
//! echoes back in every related response. Identifiers are pseudo-unique
//! correlation hints, not security tokens; 0 is reserved for "no
//! session". The allocator is an explicitly-owned value handed to
//! whatever constructs commands, so construction stays deterministic
//! in tests.

use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;

/// A 16-bit session correlation key. Never 0.
pub type SessionId = u16;

/// Monotonic, wrapping allocator of non-zero session identifiers.
///
/// Cheaply cloneable; clones share the same counter. Safe under
/// concurrent allocation.
#[derive(Debug, Clone)]
pub struct SessionAllocator {
    next: Arc<AtomicU16>,
}

impl SessionAllocator {
    /// Create an allocator starting at 1.
    pub fn new() -> Self {
        Self {
            next: Arc::new(AtomicU16::new(1)),
        }
    }

    /// Create an allocator starting at a fixed value, for deterministic
    /// test sequences. A seed of 0 is bumped to 1.
    pub fn with_seed(seed: u16) -> Self {
        Self {
            next: Arc::new(AtomicU16::new(seed.max(1))),
        }
    }

    /// Mint the next session identifier, skipping 0 on wraparound.
    pub fn allocate(&self) -> SessionId {
        loop {
            let id = self.next.fetch_add(1, Ordering::Relaxed);
            if id != 0 {
                return id;
            }
        }
    }
}

impl Default for SessionAllocator {
    fn default() -> Self {
        Self::new()
    }
}
