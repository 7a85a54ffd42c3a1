use super::{
    Block, BufferDescriptor, BufferHandle, BufferPool, BufferProvider, BufferState, ProviderId,
};
use crate::core::{EngineError, Result};
use log::trace;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Transient working buffers from the heap, storage recycled through a [`BufferPool`]
pub struct HeapBufferProvider {
    id: ProviderId,
    pool: BufferPool,
    active: AtomicUsize,
    limit: Option<usize>,
}

impl HeapBufferProvider {
    pub fn new() -> Self {
        Self {
            id: ProviderId::next(),
            pool: BufferPool::default(),
            active: AtomicUsize::new(0),
            limit: None,
        }
    }

    /// Provider refusing to hand out more than `limit` buffers at a time
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::new()
        }
    }

    /// Number of buffers locked and not yet released
    pub fn active_count(&self) -> usize {
        self.active.load(Ordering::Acquire)
    }

    pub fn pool(&self) -> &BufferPool {
        &self.pool
    }
}

impl Default for HeapBufferProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferProvider for HeapBufferProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn announce(&self, count: usize, descriptor: &BufferDescriptor) -> Result<usize> {
        self.verify_descriptor(descriptor)?;
        let possible = match self.limit {
            Some(limit) => count.min(limit.saturating_sub(self.active_count())),
            None => count,
        };
        if possible == 0 {
            return Err(EngineError::BufferManagement(
                "unable to fulfil request for buffers".to_string(),
            ));
        }
        Ok(possible)
    }

    fn lock_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferHandle> {
        self.verify_descriptor(descriptor)?;
        if let Some(limit) = self.limit {
            if self.active_count() >= limit {
                return Err(EngineError::BufferManagement(format!(
                    "all {} working buffers in use",
                    limit
                )));
            }
        }

        let block = Arc::new(Block::new(self.pool.get(descriptor.size())));
        self.active.fetch_add(1, Ordering::AcqRel);
        trace!("locked working buffer {} ({} samples)", block.id(), descriptor.size());
        Ok(BufferHandle::lock(*descriptor, block))
    }

    fn emit_buffer(&self, handle: &BufferHandle) -> Result<()> {
        self.verify_descriptor(handle.descriptor())?;
        handle.transition(BufferState::Emitted)?;
        Ok(())
    }

    fn release_buffer(&self, handle: &BufferHandle) -> Result<()> {
        self.verify_descriptor(handle.descriptor())?;
        if handle.release_lease()? == 0 {
            self.pool.recycle(handle.block().take_storage());
        }
        self.active.fetch_sub(1, Ordering::AcqRel);
        trace!("released working buffer {}", handle.block_id());
        Ok(())
    }
}
