//! Thread-safe machine handle for hosts that drive one machine from
//! several threads

use std::sync::Arc;

use parking_lot::RwLock;
use rand::Rng;
use rand::rngs::StdRng;

use crate::credits::{CreditDelta, Credits};
use crate::engine::{BetRejection, MachineState, SlotMachine};
use crate::error::ReelResult;
use crate::spin::{PendingSpin, SettleError, SpinRejection, SpinResult};

/// Cloneable handle to one [`SlotMachine`].
///
/// Each operation runs under a single write lock, so the spin guard, the
/// bet deduction and position sampling can never interleave with another
/// caller.
#[derive(Debug)]
pub struct SharedMachine<R = StdRng> {
    inner: Arc<RwLock<SlotMachine<R>>>,
}

impl<R> Clone for SharedMachine<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: Rng> SharedMachine<R> {
    pub fn new(machine: SlotMachine<R>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(machine)),
        }
    }

    pub fn request_spin(&self) -> Result<PendingSpin, SpinRejection> {
        self.inner.write().request_spin()
    }

    pub fn settle(&self, ticket: PendingSpin) -> Result<SpinResult, SettleError> {
        self.inner.write().settle(ticket)
    }

    pub fn spin(&self) -> Result<SpinResult, SpinRejection> {
        self.inner.write().spin()
    }

    pub fn add_funds(&self, amount: Credits) -> ReelResult<Credits> {
        self.inner.write().add_funds(amount)
    }

    pub fn adjust_bet(&self, delta: CreditDelta) -> Result<Credits, BetRejection> {
        self.inner.write().adjust_bet(delta)
    }

    pub fn reset_game(&self) -> MachineState {
        self.inner.write().reset_game()
    }

    pub fn state(&self) -> MachineState {
        self.inner.read().state()
    }

    /// Read access to the whole machine
    pub fn with<T>(&self, f: impl FnOnce(&SlotMachine<R>) -> T) -> T {
        f(&self.inner.read())
    }

    /// Exclusive access to the whole machine
    pub fn with_mut<T>(&self, f: impl FnOnce(&mut SlotMachine<R>) -> T) -> T {
        f(&mut self.inner.write())
    }
}
