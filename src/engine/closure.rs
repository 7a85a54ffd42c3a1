use crate::buffers::BufferHandle;
use crate::core::{FrameId, NodeId, Result};
use crate::engine::BuffTableStorage;
use crate::wiring::NodeNetwork;

/// Render state seen by a node being pulled.
///
/// The root of every pull chain is a [`RenderProcess`](crate::engine::RenderProcess);
/// each nested invocation proxies this interface for its predecessors, so a
/// predecessor sees the calling invocation as its parent state while
/// `current()` always leads back to the cache-owning root.
pub trait StateClosure {
    /// Transient buffer owned by the caller
    fn allocate_buffer(&self, size: usize) -> Result<BufferHandle>;

    /// Buffer from the cache-owning provider, so the result can be retained
    fn allocate_cached(&self, size: usize) -> Result<BufferHandle>;

    fn release_buffer(&self, handle: &BufferHandle) -> Result<()>;

    /// Declare the buffer as the finished result for `frame`
    fn is_calculated(&self, frame: &FrameId, handle: &BufferHandle) -> Result<()>;

    /// Look up an already computed result; `None` on cache miss
    fn fetch(&self, frame: &FrameId) -> Option<BufferHandle>;

    fn gen_frame_id(&self, node: NodeId, channel: usize) -> FrameId;

    fn table_storage(&self) -> &BuffTableStorage;

    fn network(&self) -> &NodeNetwork;

    /// The state implementation actually owning cache and arena
    fn current(&self) -> &dyn StateClosure;
}
