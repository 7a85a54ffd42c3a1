use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

static NEXT_BLOCK_ID: AtomicU64 = AtomicU64::new(1);

/// Storage of one buffer, shared by every lease taken on it.
///
/// `claims` counts the leases currently held; `used` and `closed` are the
/// diagnostic flags reported by the tracking provider.
#[derive(Debug)]
pub struct Block {
    id: u64,
    data: Mutex<Vec<f64>>,
    claims: AtomicUsize,
    used: AtomicBool,
    closed: AtomicBool,
    retained: AtomicBool,
}

impl Block {
    pub fn new(storage: Vec<f64>) -> Self {
        Self {
            id: NEXT_BLOCK_ID.fetch_add(1, Ordering::Relaxed),
            data: Mutex::new(storage),
            claims: AtomicUsize::new(0),
            used: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            retained: AtomicBool::new(false),
        }
    }

    /// Empty stand-in returned for diagnostic lookups out of range
    pub fn placeholder() -> Self {
        Self::new(Vec::new())
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn len(&self) -> usize {
        self.storage().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn was_used(&self) -> bool {
        self.used.load(Ordering::Acquire)
    }

    pub fn was_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn claims(&self) -> usize {
        self.claims.load(Ordering::Acquire)
    }

    /// Direct access to the contents, bypassing lease validation.
    /// Meant for diagnostics on emitted blocks.
    pub fn storage(&self) -> MutexGuard<'_, Vec<f64>> {
        self.data
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn claim(&self) {
        self.claims.fetch_add(1, Ordering::AcqRel);
        self.used.store(true, Ordering::Release);
        self.closed.store(false, Ordering::Release);
    }

    /// Drop one lease; returns the number of leases still held
    pub(crate) fn unclaim(&self) -> usize {
        let before = self
            .claims
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .unwrap_or(0);
        let remaining = before.saturating_sub(1);
        if remaining == 0 {
            self.closed.store(true, Ordering::Release);
        }
        remaining
    }

    /// Force the closed mark, used when a whole pool is discarded
    pub(crate) fn mark_released(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub(crate) fn is_retained(&self) -> bool {
        self.retained.load(Ordering::Acquire)
    }

    pub(crate) fn set_retained(&self, retained: bool) {
        self.retained.store(retained, Ordering::Release);
    }

    /// Hand the storage back for recycling; the block stays empty afterwards
    pub(crate) fn take_storage(&self) -> Vec<f64> {
        std::mem::take(&mut *self.storage())
    }
}
