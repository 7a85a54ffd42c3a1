use crate::core::{Lead, NodeId, NodeOperation};
use crate::registry;
use crate::wiring::{NodeNetwork, WiringFactory, WiringSpec, DEFAULT_BUFFER_SIZE};
use anyhow::{anyhow, bail, Context, Result};
use log::{debug, info};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Arc;

struct NodeEntry {
    id: String,
    operation: Box<dyn NodeOperation>,
    nr_out: usize,
    nr_in: usize,
    cache: bool,
    inplace: bool,
    leads: Vec<Option<(usize, usize)>>,
}

/// Builds a [`NodeNetwork`] segment from a JSON graph description:
///
/// ```json
/// {
///   "label": "demo",
///   "nodes": [
///     {"id": "osc", "type": "sinegenerator", "config": {"frequency": 440.0}},
///     {"id": "amp", "type": "gain", "config": {"gain_db": -6.0}, "cache": true}
///   ],
///   "connections": [{"from": "osc", "from_port": 0, "to": "amp", "to_port": 0}]
/// }
/// ```
///
/// Operation types are resolved through the registry.
pub struct NetworkBuilder {
    factory: WiringFactory,
    buffer_size: usize,
}

impl Default for NetworkBuilder {
    fn default() -> Self {
        Self::new(WiringFactory::new())
    }
}

impl NetworkBuilder {
    pub fn new(factory: WiringFactory) -> Self {
        Self {
            factory,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    pub fn from_json(config: &Value) -> Result<NodeNetwork> {
        Self::default().build(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<NodeNetwork> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading network description {}", path.display()))?;
        let config: Value = serde_json::from_str(&text)?;
        Self::from_json(&config)
    }

    pub fn build(&self, config: &Value) -> Result<NodeNetwork> {
        let label = config["label"].as_str().unwrap_or("network");
        let nodes_array = config["nodes"]
            .as_array()
            .ok_or(anyhow!("Network description missing 'nodes' array"))?;

        let mut entries = Vec::with_capacity(nodes_array.len());
        let mut index: HashMap<String, usize> = HashMap::new();
        for node_config in nodes_array {
            let entry = self.parse_node(node_config)?;
            if index.insert(entry.id.clone(), entries.len()).is_some() {
                bail!("Duplicate node id: {}", entry.id);
            }
            entries.push(entry);
        }

        if let Some(conns_array) = config["connections"].as_array() {
            for conn in conns_array {
                let from = conn["from"].as_str().ok_or(anyhow!("Connection missing from"))?;
                let to = conn["to"].as_str().ok_or(anyhow!("Connection missing to"))?;
                let from_port = conn["from_port"].as_u64().unwrap_or(0) as usize;
                let to_port = conn["to_port"].as_u64().unwrap_or(0) as usize;

                let &src = index.get(from).ok_or(anyhow!("Unknown node in connection: {}", from))?;
                let &dst = index.get(to).ok_or(anyhow!("Unknown node in connection: {}", to))?;
                if from_port >= entries[src].nr_out {
                    bail!("Node '{}' has no output #{}", from, from_port);
                }
                let target = &mut entries[dst];
                let slot = target
                    .leads
                    .get_mut(to_port)
                    .ok_or(anyhow!("Node '{}' has no input #{}", to, to_port))?;
                if slot.is_some() {
                    bail!("Input #{} of node '{}' is connected twice", to_port, to);
                }
                *slot = Some((src, from_port));
            }
        }

        for entry in &entries {
            if let Some(port) = entry.leads.iter().position(Option::is_none) {
                bail!("Input #{} of node '{}' is not connected", port, entry.id);
            }
        }

        let order = topological_order(&entries)?;
        let mut network = NodeNetwork::new(label);
        let mut node_ids: Vec<Option<NodeId>> = vec![None; entries.len()];
        let mut entries: Vec<Option<NodeEntry>> = entries.into_iter().map(Some).collect();

        for idx in order {
            let entry = entries[idx]
                .take()
                .ok_or(anyhow!("Node visited twice during wiring"))?;
            let leads = entry
                .leads
                .iter()
                .flatten()
                .map(|&(src, port)| {
                    node_ids[src]
                        .map(|node| Lead::new(node, port))
                        .ok_or(anyhow!("Predecessor of '{}' not wired yet", entry.id))
                })
                .collect::<Result<Vec<_>>>()?;

            let operation: Arc<dyn NodeOperation> = Arc::from(entry.operation);
            let spec = WiringSpec::new(operation, entry.nr_out, entry.nr_in)
                .cache(entry.cache)
                .inplace(entry.inplace)
                .buffer_size(self.buffer_size);
            let wiring = self
                .factory
                .build(&mut network, spec)
                .with_context(|| format!("wiring node '{}'", entry.id))?;
            node_ids[idx] = Some(network.add_node(entry.id, wiring, leads)?);
        }

        info!("built network '{}' with {} nodes", network.label(), network.len());
        Ok(network)
    }

    fn parse_node(&self, node_config: &Value) -> Result<NodeEntry> {
        let id = node_config["id"]
            .as_str()
            .ok_or(anyhow!("Node missing id"))?
            .to_string();
        let node_type = node_config["type"]
            .as_str()
            .ok_or(anyhow!("Node missing type"))?;
        let metadata =
            registry::find(node_type).ok_or(anyhow!("Unknown node type: {}", node_type))?;
        let operation = metadata
            .create_operation(node_config["config"].clone())
            .with_context(|| format!("configuring node '{}'", id))?;

        let nr_in = metadata.inputs.len();
        debug!("node '{}' of type {} ({}→{})", id, node_type, nr_in, metadata.outputs.len());
        Ok(NodeEntry {
            id,
            operation,
            nr_out: metadata.outputs.len(),
            nr_in,
            cache: node_config["cache"].as_bool().unwrap_or(false),
            inplace: node_config["inplace"].as_bool().unwrap_or(false),
            leads: vec![None; nr_in],
        })
    }
}

// Kahn's algorithm over the connected entries
fn topological_order(entries: &[NodeEntry]) -> Result<Vec<usize>> {
    let mut in_degree: Vec<usize> = entries.iter().map(|e| e.leads.len()).collect();
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); entries.len()];
    for (idx, entry) in entries.iter().enumerate() {
        for &(src, _) in entry.leads.iter().flatten() {
            successors[src].push(idx);
        }
    }

    let mut ready: VecDeque<usize> = (0..entries.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(entries.len());
    while let Some(idx) = ready.pop_front() {
        order.push(idx);
        for &next in &successors[idx] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.push_back(next);
            }
        }
    }

    if order.len() != entries.len() {
        let stuck: Vec<&str> = entries
            .iter()
            .enumerate()
            .filter(|(i, _)| in_degree[*i] > 0)
            .map(|(_, e)| e.id.as_str())
            .collect();
        bail!("Cycle detected between nodes: {}", stuck.join(", "));
    }
    Ok(order)
}
