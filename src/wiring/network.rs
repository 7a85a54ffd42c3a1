use crate::core::{EngineError, Lead, NetworkId, NodeId, ProcNode, Result};
use crate::wiring::WiringDescriptor;
use std::collections::HashMap;
use std::fmt::Write;

/// Stable index of a wiring descriptor within its [`NodeNetwork`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DescriptorId(usize);

impl DescriptorId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Arena owning all descriptors and nodes of one network segment.
///
/// Nodes refer to descriptors and predecessors by index only. A lead may
/// only point to a node added earlier, so the network is acyclic by
/// construction. Everything is torn down together with the segment.
#[derive(Debug)]
pub struct NodeNetwork {
    id: NetworkId,
    label: String,
    wirings: Vec<WiringDescriptor>,
    nodes: Vec<ProcNode>,
    names: HashMap<String, NodeId>,
}

impl NodeNetwork {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            id: NetworkId::next(),
            label: label.into(),
            wirings: Vec::new(),
            nodes: Vec::new(),
            names: HashMap::new(),
        }
    }

    /// Scopes the frame ids of this segment's results
    pub fn id(&self) -> NetworkId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn add_wiring(&mut self, descriptor: WiringDescriptor) -> DescriptorId {
        self.wirings.push(descriptor);
        DescriptorId(self.wirings.len() - 1)
    }

    pub fn wiring(&self, id: DescriptorId) -> Result<&WiringDescriptor> {
        self.wirings
            .get(id.0)
            .ok_or_else(|| EngineError::Wiring(format!("unknown wiring descriptor {}", id.0)))
    }

    /// Add a node using descriptor `wiring`; `leads` connect its inputs in port order.
    /// Source nodes take no leads. Every predecessor must deliver buffers of
    /// the node's own buffer size.
    pub fn add_node(
        &mut self,
        name: impl Into<String>,
        wiring: DescriptorId,
        leads: Vec<Lead>,
    ) -> Result<NodeId> {
        let name = name.into();
        let id = NodeId(self.nodes.len());
        let descriptor = self.wiring(wiring)?;

        if self.names.contains_key(&name) {
            return Err(EngineError::Wiring(format!("duplicate node name '{}'", name)));
        }
        let expected = if descriptor.strategy().is_source() {
            0
        } else {
            descriptor.nr_in()
        };
        if leads.len() != expected {
            return Err(EngineError::Wiring(format!(
                "node '{}' needs {} predecessor(s), got {}",
                name,
                expected,
                leads.len()
            )));
        }
        for lead in &leads {
            let predecessor = self.nodes.get(lead.node.index()).ok_or_else(|| {
                EngineError::Wiring(format!(
                    "node '{}' refers to {}, which is not an earlier node",
                    name, lead.node
                ))
            })?;
            let upstream = self.wiring(predecessor.wiring_id())?;
            if lead.port >= upstream.nr_out() {
                return Err(EngineError::Wiring(format!(
                    "node '{}' connects to output #{} of '{}', which has {} outputs",
                    name,
                    lead.port,
                    predecessor.name(),
                    upstream.nr_out()
                )));
            }
            // inputs and outputs of one invocation share a single buffer size
            if upstream.buffer_size() != descriptor.buffer_size() {
                return Err(EngineError::Wiring(format!(
                    "node '{}' uses buffers of {} samples, but '{}' delivers {}",
                    name,
                    descriptor.buffer_size(),
                    predecessor.name(),
                    upstream.buffer_size()
                )));
            }
        }

        self.names.insert(name.clone(), id);
        self.nodes.push(ProcNode::new(id, name, wiring, leads));
        Ok(id)
    }

    pub fn node(&self, id: NodeId) -> Result<&ProcNode> {
        self.nodes
            .get(id.index())
            .ok_or_else(|| EngineError::Wiring(format!("unknown node {}", id)))
    }

    pub fn node_named(&self, name: &str) -> Option<&ProcNode> {
        self.names.get(name).and_then(|id| self.nodes.get(id.index()))
    }

    pub fn nodes(&self) -> &[ProcNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn wiring_count(&self) -> usize {
        self.wirings.len()
    }

    /// One line per node: name, wiring and predecessors
    pub fn describe(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "network '{}' ({} nodes)", self.label, self.nodes.len());
        for (idx, node) in self.nodes.iter().enumerate() {
            let wiring = match self.wirings.get(node.wiring_id().index()) {
                Some(w) => w.to_string(),
                None => "<unwired>".to_string(),
            };
            let leads: Vec<String> = node
                .leads()
                .iter()
                .map(|lead| format!("{}:{}", lead.node, lead.port))
                .collect();
            let _ = writeln!(
                out,
                "  #{} '{}': {} <- [{}]",
                idx,
                node.name(),
                wiring,
                leads.join(", ")
            );
        }
        out
    }
}
