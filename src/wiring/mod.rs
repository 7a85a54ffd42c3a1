//! Graph construction: configuration flags, the dispatch table from
//! configuration code to wiring factory, and the network segment arena.

pub mod builder;
pub mod config;
pub mod descriptor;
pub mod factory;
pub mod network;
pub mod selector;

pub use builder::NetworkBuilder;
pub use config::Configuration;
pub use descriptor::WiringDescriptor;
pub use factory::{WiringFactory, WiringSpec, DEFAULT_BUFFER_SIZE};
pub use network::{DescriptorId, NodeNetwork};
pub use selector::{ConfigSelector, WiringFn};
