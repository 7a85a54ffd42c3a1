use super::{Block, BufferState};
use crate::core::{EngineError, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

static NEXT_PROVIDER_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a buffer provider instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProviderId(u64);

impl ProviderId {
    pub fn next() -> Self {
        Self(NEXT_PROVIDER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Describes a kind of buffer (its size in samples) offered by one provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferDescriptor {
    provider: ProviderId,
    size: usize,
}

impl BufferDescriptor {
    pub fn new(provider: ProviderId, size: usize) -> Self {
        Self { provider, size }
    }

    pub fn provider(&self) -> ProviderId {
        self.provider
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

/// One locking transaction on a block
#[derive(Debug)]
struct Lease {
    state: Mutex<BufferState>,
}

/// Capability to use one locked buffer.
///
/// Clones share the same lease: releasing through any of them ends the
/// transaction for all, and a lease must be released exactly once.
#[derive(Debug, Clone)]
pub struct BufferHandle {
    descriptor: BufferDescriptor,
    block: Arc<Block>,
    lease: Arc<Lease>,
}

impl BufferHandle {
    pub(crate) fn lock(descriptor: BufferDescriptor, block: Arc<Block>) -> Self {
        Self::with_state(descriptor, block, BufferState::Locked)
    }

    /// Lease on a block whose contents are already final (cache hit)
    pub(crate) fn emitted(descriptor: BufferDescriptor, block: Arc<Block>) -> Self {
        Self::with_state(descriptor, block, BufferState::Emitted)
    }

    fn with_state(descriptor: BufferDescriptor, block: Arc<Block>, state: BufferState) -> Self {
        block.claim();
        Self {
            descriptor,
            block,
            lease: Arc::new(Lease {
                state: Mutex::new(state),
            }),
        }
    }

    pub fn descriptor(&self) -> &BufferDescriptor {
        &self.descriptor
    }

    pub fn provider(&self) -> ProviderId {
        self.descriptor.provider()
    }

    pub fn block(&self) -> &Arc<Block> {
        &self.block
    }

    pub fn block_id(&self) -> u64 {
        self.block.id()
    }

    pub fn state(&self) -> BufferState {
        *self.lease_state()
    }

    pub fn is_valid(&self) -> bool {
        self.state().is_accessible()
    }

    /// Whether both handles belong to the same locking transaction
    pub fn same_lease(&self, other: &BufferHandle) -> bool {
        Arc::ptr_eq(&self.lease, &other.lease)
    }

    pub fn read(&self) -> Result<MutexGuard<'_, Vec<f64>>> {
        self.access()
    }

    pub fn write(&self) -> Result<MutexGuard<'_, Vec<f64>>> {
        self.access()
    }

    fn access(&self) -> Result<MutexGuard<'_, Vec<f64>>> {
        if !self.is_valid() {
            return Err(EngineError::InvalidHandle);
        }
        Ok(self.block.storage())
    }

    /// Move the lease into `target`, returning the previous state
    pub(crate) fn transition(&self, target: BufferState) -> Result<BufferState> {
        let mut state = self.lease_state();
        if !state.can_transition_to(target) {
            return Err(EngineError::Lifecycle {
                from: *state,
                to: target,
            });
        }
        let previous = *state;
        *state = target;
        Ok(previous)
    }

    /// End the transaction; returns the number of leases still held on the block
    pub(crate) fn release_lease(&self) -> Result<usize> {
        self.transition(BufferState::Free)?;
        Ok(self.block.unclaim())
    }

    fn lease_state(&self) -> MutexGuard<'_, BufferState> {
        self.lease
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
