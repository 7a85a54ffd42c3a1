use crate::buffers::BufferHandle;
use crate::core::{EngineError, NodeId, Result};
use crate::engine::StateClosure;
use crate::wiring::DescriptorId;
use serde::{Deserialize, Serialize};

/// Connection of one input port to an output port of a predecessor node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub node: NodeId,
    pub port: usize,
}

impl Lead {
    pub fn new(node: NodeId, port: usize) -> Self {
        Self { node, port }
    }
}

/// Invocation surface of a render node
pub trait ProcessingNode: Send + Sync {
    fn id(&self) -> NodeId;

    /// Render and pull output `output` of this node.
    ///
    /// On return the handle refers to a valid buffer holding the computed
    /// (or cache-retrieved) result; its ownership passes to the caller, who
    /// must release it through the state it pulled with.
    fn pull(&self, state: &dyn StateClosure, output: usize) -> Result<BufferHandle>;
}

/// A node of the render network.
///
/// Holds no mutable state: the wiring descriptor lives in the network
/// segment and is referenced by index, possibly shared with other nodes.
#[derive(Debug, Clone)]
pub struct ProcNode {
    id: NodeId,
    name: String,
    wiring: DescriptorId,
    leads: Vec<Lead>,
}

impl ProcNode {
    pub(crate) fn new(id: NodeId, name: String, wiring: DescriptorId, leads: Vec<Lead>) -> Self {
        Self {
            id,
            name,
            wiring,
            leads,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn wiring_id(&self) -> DescriptorId {
        self.wiring
    }

    pub fn leads(&self) -> &[Lead] {
        &self.leads
    }

    pub fn lead(&self, port: usize) -> Result<&Lead> {
        self.leads.get(port).ok_or_else(|| {
            EngineError::Wiring(format!(
                "node '{}' has no predecessor for input #{} ({} leads)",
                self.name,
                port,
                self.leads.len()
            ))
        })
    }

    pub fn is_source(&self) -> bool {
        self.leads.is_empty()
    }
}

impl ProcessingNode for ProcNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn pull(&self, state: &dyn StateClosure, output: usize) -> Result<BufferHandle> {
        let wiring = state.network().wiring(self.wiring)?;
        wiring.call_down(self, state, output)
    }
}
