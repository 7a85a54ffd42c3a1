use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_NETWORK_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a network segment; unique within the process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NetworkId(u64);

impl NetworkId {
    pub fn next() -> Self {
        Self(NEXT_NETWORK_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "N{}", self.0)
    }
}

/// Index of a node within its network segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Key of one computed result: the network segment, a frame number, the
/// node producing it and the output channel of that node.
///
/// Node indices restart at zero in every segment, so the segment is part
/// of the key whenever several networks share a cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameId {
    pub network: NetworkId,
    pub frame: i64,
    pub node: NodeId,
    pub channel: usize,
}

impl FrameId {
    pub fn new(network: NetworkId, frame: i64, node: NodeId, channel: usize) -> Self {
        Self {
            network,
            frame,
            node,
            channel,
        }
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "frame {} of node {}{} ch{}",
            self.frame, self.network, self.node, self.channel
        )
    }
}
