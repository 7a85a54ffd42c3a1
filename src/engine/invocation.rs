use crate::buffers::BufferHandle;
use crate::core::{EngineError, FrameId, NodeId, ProcNode, ProcessingNode, Result};
use crate::engine::{BuffTableStorage, BufferTable, StateClosure};
use crate::wiring::{NodeNetwork, WiringDescriptor};

/// Invocation state of a single `pull()` call.
///
/// Built on the stack by the wiring descriptor and threaded through the
/// steps of the strategy pipeline. The buffer table is attached only once
/// the pipeline decides to compute (after a possible cache hit) and is
/// detached again before the call returns. Acts as the parent state for
/// every predecessor pulled from here.
pub struct Invocation<'a> {
    parent: &'a dyn StateClosure,
    current: &'a dyn StateClosure,
    node: &'a ProcNode,
    wiring: &'a WiringDescriptor,
    out_nr: usize,
    pub(crate) table: Option<BufferTable<'a>>,
}

impl<'a> Invocation<'a> {
    pub fn new(
        parent: &'a dyn StateClosure,
        node: &'a ProcNode,
        wiring: &'a WiringDescriptor,
        out_nr: usize,
    ) -> Self {
        Self {
            parent,
            current: parent.current(),
            node,
            wiring,
            out_nr,
            table: None,
        }
    }

    pub fn nr_out(&self) -> usize {
        self.wiring.nr_out()
    }

    pub fn nr_in(&self) -> usize {
        self.wiring.nr_in()
    }

    pub fn buff_tab_size(&self) -> usize {
        self.nr_out() + self.nr_in()
    }

    /// The output requested by the caller
    pub fn out_nr(&self) -> usize {
        self.out_nr
    }

    pub fn node(&self) -> &'a ProcNode {
        self.node
    }

    pub fn wiring(&self) -> &'a WiringDescriptor {
        self.wiring
    }

    pub fn parent(&self) -> &'a dyn StateClosure {
        self.parent
    }

    pub fn current_state(&self) -> &'a dyn StateClosure {
        self.current
    }

    pub fn network_ref(&self) -> &'a NodeNetwork {
        self.current.network()
    }

    /// Frame id of the requested output
    pub fn frame_id(&self) -> FrameId {
        self.channel_frame(self.out_nr)
    }

    pub fn channel_frame(&self, channel: usize) -> FrameId {
        self.current.gen_frame_id(self.node.id(), channel)
    }

    pub fn table(&self) -> Result<&BufferTable<'a>> {
        self.table
            .as_ref()
            .ok_or(EngineError::Logic("buffer table not allocated"))
    }

    /// Table attached and laid out as this node's wiring demands
    pub fn buff_tab_is_consistent(&self) -> bool {
        match &self.table {
            Some(table) => {
                table.is_consistent()
                    && table.nr_out() == self.nr_out()
                    && table.nr_in() == self.nr_in()
                    && 0 < self.buff_tab_size()
            }
            None => false,
        }
    }

    pub(crate) fn processing_error(&self, cause: anyhow::Error) -> EngineError {
        EngineError::Processing {
            node: self.node.name().to_string(),
            cause,
        }
    }
}

impl StateClosure for Invocation<'_> {
    fn allocate_buffer(&self, size: usize) -> Result<BufferHandle> {
        self.parent.allocate_buffer(size)
    }

    fn allocate_cached(&self, size: usize) -> Result<BufferHandle> {
        self.current.allocate_cached(size)
    }

    fn release_buffer(&self, handle: &BufferHandle) -> Result<()> {
        self.current.release_buffer(handle)
    }

    fn is_calculated(&self, frame: &FrameId, handle: &BufferHandle) -> Result<()> {
        self.current.is_calculated(frame, handle)
    }

    fn fetch(&self, frame: &FrameId) -> Option<BufferHandle> {
        self.current.fetch(frame)
    }

    fn gen_frame_id(&self, node: NodeId, channel: usize) -> FrameId {
        self.current.gen_frame_id(node, channel)
    }

    fn table_storage(&self) -> &BuffTableStorage {
        self.current.table_storage()
    }

    fn network(&self) -> &NodeNetwork {
        self.current.network()
    }

    fn current(&self) -> &dyn StateClosure {
        self.current
    }
}
