use super::{Block, BufferDescriptor, BufferHandle, BufferProvider, BufferState, ProviderId};
use crate::core::{EngineError, Result};
use log::{error, info, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Hardwired limit on the emitted-buffer ids accepted for inspection
pub const MAX_BUFFERS: usize = 50;

/// Blocks of one buffer size, still under responsibility of the provider
#[derive(Default)]
struct BlockPool {
    blocks: Vec<Arc<Block>>,
    max_alloc: usize,
}

impl BlockPool {
    fn prepare_for(&self, expected: usize) -> usize {
        if self.max_alloc > 0 && self.max_alloc < self.blocks.len() + expected {
            return self.max_alloc.saturating_sub(self.blocks.len());
        }
        expected
    }

    fn create_block(&mut self, size: usize) -> Arc<Block> {
        let block = Arc::new(Block::new(vec![0.0; size]));
        self.blocks.push(block.clone());
        block
    }

    /// Detach the block from this pool, if it still lives here
    fn transfer_responsibility(&mut self, id: u64) -> Option<Arc<Block>> {
        let pos = self.blocks.iter().position(|b| b.id() == id)?;
        Some(self.blocks.remove(pos))
    }

    fn discard(&self) {
        for block in &self.blocks {
            block.mark_released();
        }
    }
}

/// Diagnostic buffer provider.
///
/// Does plain heap allocations but keeps every block around. Emitting a
/// buffer moves its block into an output sequence, in emission order, where
/// it remains for later investigation.
pub struct TrackingHeapBlockProvider {
    id: ProviderId,
    pools: Mutex<HashMap<usize, BlockPool>>,
    out_seq: Mutex<Vec<Arc<Block>>>,
    max_alloc: usize,
}

impl TrackingHeapBlockProvider {
    pub fn new() -> Self {
        Self::with_limit(0)
    }

    /// Limit the blocks allocated per buffer size; 0 means unlimited
    pub fn with_limit(max_alloc: usize) -> Self {
        Self {
            id: ProviderId::next(),
            pools: Mutex::new(HashMap::new()),
            out_seq: Mutex::new(Vec::new()),
            max_alloc,
        }
    }

    pub fn emitted_count(&self) -> usize {
        self.emitted().len()
    }

    /// The block emitted as `buffer_id`-th, or an empty placeholder if not (yet) emitted
    pub fn access_emitted(&self, buffer_id: usize) -> Result<Arc<Block>> {
        if buffer_id >= MAX_BUFFERS {
            return Err(EngineError::BufferManagement(
                "hardwired internal limit for test buffers exceeded".to_string(),
            ));
        }
        Ok(self
            .emitted()
            .get(buffer_id)
            .cloned()
            .unwrap_or_else(|| Arc::new(Block::placeholder())))
    }

    /// Move every block still in the pools into the output sequence
    pub fn mark_all_emitted(&self) {
        let mut pools = self.pools();
        let mut out_seq = self.emitted();
        for pool in pools.values_mut() {
            out_seq.append(&mut pool.blocks);
        }
    }

    /// Mark all blocks still held in the pools as disposed
    pub fn discard_pools(&self) {
        for pool in self.pools().values() {
            pool.discard();
        }
    }

    /// Blocks currently allocated and not emitted
    pub fn pooled_count(&self) -> usize {
        self.pools().values().map(|p| p.blocks.len()).sum()
    }

    /// True when every block ever used has been closed again
    pub fn all_idle(&self) -> bool {
        let sane = |block: &Arc<Block>| !block.was_used() || block.was_closed();
        self.pools()
            .values()
            .all(|pool| pool.blocks.iter().all(sane))
            && self.emitted().iter().all(sane)
    }

    fn pools(&self) -> MutexGuard<'_, HashMap<usize, BlockPool>> {
        self.pools
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn emitted(&self) -> MutexGuard<'_, Vec<Arc<Block>>> {
        self.out_seq
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for TrackingHeapBlockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferProvider for TrackingHeapBlockProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn announce(&self, count: usize, descriptor: &BufferDescriptor) -> Result<usize> {
        self.verify_descriptor(descriptor)?;
        let max_alloc = self.max_alloc;
        let possible = self
            .pools()
            .entry(descriptor.size())
            .or_insert_with(|| BlockPool {
                max_alloc,
                ..BlockPool::default()
            })
            .prepare_for(count);
        if possible == 0 {
            return Err(EngineError::BufferManagement(
                "unable to fulfil request for buffers".to_string(),
            ));
        }
        Ok(possible)
    }

    fn lock_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferHandle> {
        self.verify_descriptor(descriptor)?;
        let max_alloc = self.max_alloc;
        let mut pools = self.pools();
        let pool = pools.entry(descriptor.size()).or_insert_with(|| BlockPool {
            max_alloc,
            ..BlockPool::default()
        });
        if pool.prepare_for(1) == 0 {
            return Err(EngineError::BufferManagement(format!(
                "allocation limit of {} blocks reached",
                max_alloc
            )));
        }
        let block = pool.create_block(descriptor.size());
        Ok(BufferHandle::lock(*descriptor, block))
    }

    fn emit_buffer(&self, handle: &BufferHandle) -> Result<()> {
        self.verify_descriptor(handle.descriptor())?;
        handle.transition(BufferState::Emitted)?;

        let active = self
            .pools()
            .get_mut(&handle.descriptor().size())
            .and_then(|pool| pool.transfer_responsibility(handle.block_id()));
        match active {
            Some(block) => self.emitted().push(block),
            None if handle.block().was_closed() => {
                warn!("Attempt to emit() an already closed buffer.")
            }
            None => warn!(
                "Attempt to emit() a buffer not found in active pool. Maybe duplicate call to emit()?"
            ),
        }
        Ok(())
    }

    fn release_buffer(&self, handle: &BufferHandle) -> Result<()> {
        self.verify_descriptor(handle.descriptor())?;
        handle.release_lease()?;
        Ok(())
    }
}

impl Drop for TrackingHeapBlockProvider {
    fn drop(&mut self) {
        if !self.all_idle() {
            error!(
                "Block actively in use while shutting down diagnostic BufferProvider allocation pool"
            );
        }
        info!("discarding {} diagnostic buffer entries", self.emitted_count());
    }
}
