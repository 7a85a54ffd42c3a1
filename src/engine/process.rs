use crate::buffers::{BufferHandle, BufferProvider};
use crate::core::{FrameId, NodeId, ProcessingNode, Result};
use crate::engine::{BuffTableStorage, FrameCache, StateClosure};
use crate::wiring::NodeNetwork;
use std::cell::Cell;
use std::sync::Arc;

/// Root state of one calculation stream.
///
/// Owns the buffer table arena and knows the working provider for transient
/// buffers and the frame cache. Not shared between threads: every stream
/// creates its own, while network, providers and cache are shared.
pub struct RenderProcess<'n> {
    network: &'n NodeNetwork,
    working: Arc<dyn BufferProvider>,
    cache: Arc<FrameCache>,
    storage: BuffTableStorage,
    frame: Cell<i64>,
}

impl<'n> RenderProcess<'n> {
    pub fn new(
        network: &'n NodeNetwork,
        working: Arc<dyn BufferProvider>,
        cache: Arc<FrameCache>,
        table_capacity: usize,
    ) -> Self {
        Self {
            network,
            working,
            cache,
            storage: BuffTableStorage::new(table_capacity),
            frame: Cell::new(0),
        }
    }

    /// Select the frame subsequent pulls are keyed with
    pub fn set_frame(&self, frame: i64) {
        self.frame.set(frame);
    }

    pub fn frame(&self) -> i64 {
        self.frame.get()
    }

    pub fn cache(&self) -> &Arc<FrameCache> {
        &self.cache
    }

    /// Pull output `output` of `node` for the current frame
    pub fn pull(&self, node: NodeId, output: usize) -> Result<BufferHandle> {
        self.network.node(node)?.pull(self, output)
    }
}

impl StateClosure for RenderProcess<'_> {
    fn allocate_buffer(&self, size: usize) -> Result<BufferHandle> {
        self.working.lock_buffer(&self.working.descriptor_for(size))
    }

    fn allocate_cached(&self, size: usize) -> Result<BufferHandle> {
        self.cache.lock_buffer(&self.cache.descriptor_for(size))
    }

    fn release_buffer(&self, handle: &BufferHandle) -> Result<()> {
        if handle.provider() == self.cache.id() {
            self.cache.release_buffer(handle)
        } else {
            self.working.release_buffer(handle)
        }
    }

    fn is_calculated(&self, frame: &FrameId, handle: &BufferHandle) -> Result<()> {
        self.cache.is_calculated(frame, handle)
    }

    fn fetch(&self, frame: &FrameId) -> Option<BufferHandle> {
        self.cache.fetch(frame)
    }

    fn gen_frame_id(&self, node: NodeId, channel: usize) -> FrameId {
        FrameId::new(self.network.id(), self.frame.get(), node, channel)
    }

    fn table_storage(&self) -> &BuffTableStorage {
        &self.storage
    }

    fn network(&self) -> &NodeNetwork {
        self.network
    }

    fn current(&self) -> &dyn StateClosure {
        self
    }
}
