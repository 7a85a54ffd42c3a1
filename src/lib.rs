//! Pull-driven render node network.
//!
//! A network of processing nodes is pulled frame by frame. Each node runs a
//! fixed strategy pipeline, chosen once at construction from its
//! configuration flags, that queries the frame cache, pulls predecessors,
//! allocates output buffers, processes, feeds the cache and releases what
//! the caller does not need.

pub mod buffers;
pub mod config;
pub mod core;
pub mod engine;
pub mod nodes;
pub mod registry;
pub mod wiring;

pub use crate::config::EngineConfig;
pub use crate::core::{EngineError, NodeId, ProcessingNode, Result};
pub use crate::engine::{CalcStream, FrameCache, RenderProcess};
pub use crate::wiring::{NetworkBuilder, NodeNetwork, WiringFactory, WiringSpec};
