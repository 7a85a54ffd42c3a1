use crate::core::{EngineError, NodeOperation, Result};
use crate::engine::OutputAlloc;
use crate::wiring::{ConfigSelector, Configuration, DescriptorId, NodeNetwork};
use log::debug;
use std::sync::Arc;

pub const DEFAULT_BUFFER_SIZE: usize = 1024;

/// Port layout and flags requested for one node
#[derive(Clone)]
pub struct WiringSpec {
    pub nr_out: usize,
    pub nr_in: usize,
    pub operation: Arc<dyn NodeOperation>,
    pub cache: bool,
    pub inplace: bool,
    pub buffer_size: usize,
}

impl WiringSpec {
    pub fn new(operation: Arc<dyn NodeOperation>, nr_out: usize, nr_in: usize) -> Self {
        Self {
            nr_out,
            nr_in,
            operation,
            cache: false,
            inplace: false,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    pub fn cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    pub fn inplace(mut self, inplace: bool) -> Self {
        self.inplace = inplace;
        self
    }

    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }
}

/// Turns a port layout plus cache flag into a configured wiring descriptor,
/// dispatching through the [`ConfigSelector`].
#[derive(Debug, Clone)]
pub struct WiringFactory {
    selector: ConfigSelector,
}

impl Default for WiringFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl WiringFactory {
    pub fn new() -> Self {
        Self {
            selector: ConfigSelector::meaningful(),
        }
    }

    pub fn with_selector(selector: ConfigSelector) -> Self {
        Self { selector }
    }

    pub fn selector(&self) -> &ConfigSelector {
        &self.selector
    }

    /// Flag extraction: a node with inputs processes, without inputs it reads source data
    pub fn configuration(nr_in: usize, cache: bool, inplace: bool) -> Configuration {
        Configuration::from_flags(cache, nr_in > 0, inplace)
    }

    /// Wire a descriptor into `network` according to `spec`
    pub fn build(&self, network: &mut NodeNetwork, spec: WiringSpec) -> Result<DescriptorId> {
        if spec.nr_out == 0 {
            return Err(EngineError::Wiring(format!(
                "{}: a node needs at least one output",
                spec.operation.name()
            )));
        }
        if spec.buffer_size == 0 {
            return Err(EngineError::Wiring(format!(
                "{}: zero buffer size",
                spec.operation.name()
            )));
        }

        let config = Self::configuration(spec.nr_in, spec.cache, spec.inplace);
        let factory = self.selector.get(config.code())?;
        let strategy = self.selector.strategy_for(config.code())?;
        // only a pipeline actually reusing inputs needs one per output
        if strategy.output_alloc() == Some(OutputAlloc::InPlace) && spec.nr_in < spec.nr_out {
            return Err(EngineError::Wiring(format!(
                "{}: in-place processing needs an input for each of the {} outputs, got {}",
                spec.operation.name(),
                spec.nr_out,
                spec.nr_in
            )));
        }

        let mut spec = spec;
        if !config.contains(Configuration::PROCESS) {
            // one raw channel per output, read into the same buffer
            spec.nr_in = spec.nr_out;
        }
        let id = (factory.as_ref())(network, &spec)?;
        debug!(
            "wired {} as {} (config {:03b})",
            spec.operation.name(),
            strategy.name(),
            config.code()
        );
        Ok(id)
    }

    /// Build from the bare `(nr_out, nr_in, cache)` triple
    pub fn wire(
        &self,
        network: &mut NodeNetwork,
        operation: Arc<dyn NodeOperation>,
        nr_out: usize,
        nr_in: usize,
        cache: bool,
    ) -> Result<DescriptorId> {
        self.build(network, WiringSpec::new(operation, nr_out, nr_in).cache(cache))
    }
}
