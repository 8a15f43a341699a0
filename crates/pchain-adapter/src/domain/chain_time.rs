//! # Chain-Time Register
//!
//! Two-phase holder for the chain's current time (unix seconds). A block's
//! time is proposed while the block is processed and committed only once the
//! block decoded cleanly.
//!
//! Each field has its own lock, so readers of the committed value never wait
//! on a proposal and vice versa.

use parking_lot::RwLock;

/// Committed plus speculative chain time.
#[derive(Debug, Default)]
pub struct ChainTimeRegister {
    value: RwLock<u64>,
    proposed: RwLock<u64>,
}

impl ChainTimeRegister {
    pub fn new(value: u64) -> Self {
        Self {
            value: RwLock::new(value),
            proposed: RwLock::new(0),
        }
    }

    /// Committed value.
    pub fn read(&self) -> u64 {
        *self.value.read()
    }

    pub fn write(&self, value: u64) {
        *self.value.write() = value;
    }

    /// Stage `value` without touching the committed value.
    pub fn propose_write(&self, value: u64) {
        *self.proposed.write() = value;
    }

    pub fn proposed(&self) -> u64 {
        *self.proposed.read()
    }

    /// Commit the staged value. No-op while nothing is staged.
    pub fn accept_proposed_write(&self) {
        let proposed = *self.proposed.read();
        if proposed == 0 {
            return;
        }
        *self.value.write() = proposed;
    }

    /// Drop the staged value.
    pub fn reject_proposed_write(&self) {
        *self.proposed.write() = 0;
    }
}
