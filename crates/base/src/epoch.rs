use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

/// A shared generation counter for cancelling delayed work.
///
/// Work scheduled for later (a timer, an in-flight job) captures the epoch
/// value current at scheduling time. Calling `advance()` invalidates every
/// such capture at once, so a late arrival can check `is_current()` and drop
/// itself instead of acting on state that has moved on.
#[derive(Clone, Debug)]
pub struct Epoch {
    value: Arc<AtomicU64>,
}

impl Epoch {
    pub fn new() -> Self {
        Self {
            value: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn current(&self) -> u64 {
        self.value.load(Ordering::Acquire)
    }

    /// Move to the next epoch and return it.
    pub fn advance(&self) -> u64 {
        self.value.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn is_current(&self, epoch: u64) -> bool {
        epoch == self.current()
    }
}

impl Default for Epoch {
    fn default() -> Self {
        Self::new()
    }
}
