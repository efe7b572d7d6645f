// Concurrency gate - bounds the number of live tool processes
#![allow(dead_code)]

use crate::executor::error::{ExecutorError, Result};
use std::sync::{Arc, Mutex};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

/// Counting admission gate; waiters are woken in FIFO order
#[derive(Debug)]
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

/// Slot held for the lifetime of one run; released on drop
#[derive(Debug)]
pub struct GatePermit {
    _permit: OwnedSemaphorePermit,
}

impl ConcurrencyGate {
    /// Gate with `capacity` slots, clamped to `1..=Semaphore::MAX_PERMITS`
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, Semaphore::MAX_PERMITS);
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// Wait for a free slot
    pub async fn acquire(&self) -> Result<GatePermit> {
        let permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ExecutorError::GateClosed)?;
        Ok(GatePermit { _permit: permit })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }
}

/// Lazily built gate, rebuilt after a policy reload
#[derive(Debug, Default)]
pub struct GateSlot {
    cached: Mutex<Option<Arc<ConcurrencyGate>>>,
}

impl GateSlot {
    /// Cached gate, building one sized by `capacity` if none exists
    pub fn get_or_init(&self, capacity: impl FnOnce() -> usize) -> Arc<ConcurrencyGate> {
        let mut cached = self.cached.lock().unwrap_or_else(|e| e.into_inner());
        cached
            .get_or_insert_with(|| {
                let gate = ConcurrencyGate::new(capacity());
                debug!(capacity = gate.capacity(), "concurrency gate created");
                Arc::new(gate)
            })
            .clone()
    }

    pub fn current(&self) -> Option<Arc<ConcurrencyGate>> {
        self.cached.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Drop the cached gate; runs holding its permits are unaffected
    pub fn reset(&self) {
        self.cached.lock().unwrap_or_else(|e| e.into_inner()).take();
    }
}
