use crate::buffers::{
    Block, BufferDescriptor, BufferHandle, BufferPool, BufferProvider, BufferState, ProviderId,
};
use crate::core::{FrameId, Result};
use log::{debug, trace};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Cache-owning buffer provider.
///
/// Buffers locked here may be declared calculated, which retains their
/// block under the frame id in an LRU index. Shared by all calculation
/// streams; emplacement is atomic and the first writer wins.
pub struct FrameCache {
    id: ProviderId,
    index: Mutex<LruCache<FrameId, Arc<Block>>>,
    pool: BufferPool,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl FrameCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            id: ProviderId::next(),
            index: Mutex::new(LruCache::new(capacity)),
            pool: BufferPool::default(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// New lease on the retained result for `frame`, if present
    pub fn fetch(&self, frame: &FrameId) -> Option<BufferHandle> {
        // claim under the index lock: eviction only recycles unclaimed blocks
        let mut index = self.index();
        match index.get(frame) {
            Some(block) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!("cache hit for {}", frame);
                let descriptor = self.descriptor_for(block.len());
                Some(BufferHandle::emitted(descriptor, block.clone()))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                trace!("cache miss for {}", frame);
                None
            }
        }
    }

    /// Emit the buffer and retain it as the result for `frame`
    pub fn is_calculated(&self, frame: &FrameId, handle: &BufferHandle) -> Result<()> {
        self.verify_descriptor(handle.descriptor())?;
        handle.transition(BufferState::Emitted)?;

        let mut index = self.index();
        if index.contains(frame) {
            debug!("{} already cached by another stream, keeping first result", frame);
            return Ok(());
        }
        handle.block().set_retained(true);
        if let Some((evicted_frame, evicted)) = index.push(*frame, handle.block().clone()) {
            trace!("evicting {}", evicted_frame);
            evicted.set_retained(false);
            if evicted.claims() == 0 {
                self.pool.recycle(evicted.take_storage());
            }
        }
        Ok(())
    }

    pub fn contains(&self, frame: &FrameId) -> bool {
        self.index().contains(frame)
    }

    pub fn len(&self) -> usize {
        self.index().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Drop all retained results
    pub fn clear(&self) {
        let mut index = self.index();
        for (_, block) in index.iter() {
            block.set_retained(false);
        }
        index.clear();
    }

    fn index(&self) -> MutexGuard<'_, LruCache<FrameId, Arc<Block>>> {
        self.index
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl BufferProvider for FrameCache {
    fn id(&self) -> ProviderId {
        self.id
    }

    fn announce(&self, count: usize, descriptor: &BufferDescriptor) -> Result<usize> {
        self.verify_descriptor(descriptor)?;
        Ok(count)
    }

    fn lock_buffer(&self, descriptor: &BufferDescriptor) -> Result<BufferHandle> {
        self.verify_descriptor(descriptor)?;
        let block = Arc::new(Block::new(self.pool.get(descriptor.size())));
        Ok(BufferHandle::lock(*descriptor, block))
    }

    fn emit_buffer(&self, handle: &BufferHandle) -> Result<()> {
        self.verify_descriptor(handle.descriptor())?;
        handle.transition(BufferState::Emitted)?;
        Ok(())
    }

    fn release_buffer(&self, handle: &BufferHandle) -> Result<()> {
        self.verify_descriptor(handle.descriptor())?;
        let remaining = handle.release_lease()?;
        if remaining == 0 && !handle.block().is_retained() {
            self.pool.recycle(handle.block().take_storage());
        }
        Ok(())
    }
}
