pub mod error;
pub mod frame;
pub mod node;
pub mod operation;

pub use error::{EngineError, Result};
pub use frame::{FrameId, NetworkId, NodeId};
pub use node::{Lead, ProcNode, ProcessingNode};
pub use operation::NodeOperation;
