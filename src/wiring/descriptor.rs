use crate::buffers::BufferHandle;
use crate::core::{EngineError, NodeOperation, ProcNode, Result};
use crate::engine::{Invocation, StateClosure, Strategy};
use crate::wiring::Configuration;
use log::trace;
use std::fmt;
use std::sync::Arc;

/// Immutable invocation setup of a node: port counts, the processing
/// operation and the frozen strategy pipeline. Owns no buffers and may be
/// shared by many nodes.
pub struct WiringDescriptor {
    nr_out: usize,
    nr_in: usize,
    operation: Arc<dyn NodeOperation>,
    config: Configuration,
    strategy: Strategy,
    buffer_size: usize,
}

impl WiringDescriptor {
    pub(crate) fn new(
        nr_out: usize,
        nr_in: usize,
        operation: Arc<dyn NodeOperation>,
        config: Configuration,
        strategy: Strategy,
        buffer_size: usize,
    ) -> Self {
        Self {
            nr_out,
            nr_in,
            operation,
            config,
            strategy,
            buffer_size,
        }
    }

    pub fn nr_out(&self) -> usize {
        self.nr_out
    }

    /// Number of input slots; for sources the number of raw channels read
    pub fn nr_in(&self) -> usize {
        self.nr_in
    }

    pub fn operation(&self) -> &Arc<dyn NodeOperation> {
        &self.operation
    }

    pub fn config(&self) -> Configuration {
        self.config
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Samples per buffer for every output of this node
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Set up the invocation state on the stack and run the strategy pipeline
    pub(crate) fn call_down(
        &self,
        node: &ProcNode,
        state: &dyn StateClosure,
        output: usize,
    ) -> Result<BufferHandle> {
        if output >= self.nr_out {
            return Err(EngineError::Wiring(format!(
                "accessing output #{} of node '{}', while only {} outputs are defined",
                output,
                node.name(),
                self.nr_out
            )));
        }
        trace!("pull '{}' #{} via {}", node.name(), output, self.strategy.name());
        let mut invocation = Invocation::new(state, node, self, output);
        self.strategy.run(&mut invocation)
    }
}

impl fmt::Debug for WiringDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WiringDescriptor")
            .field("nr_out", &self.nr_out)
            .field("nr_in", &self.nr_in)
            .field("operation", &self.operation.name())
            .field("config", &self.config)
            .field("strategy", &self.strategy)
            .field("buffer_size", &self.buffer_size)
            .finish()
    }
}

impl fmt::Display for WiringDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({}→{}) {} via {}",
            self.operation.name(),
            self.nr_in,
            self.nr_out,
            self.config,
            self.strategy
        )
    }
}
