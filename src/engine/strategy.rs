use crate::buffers::BufferHandle;
use crate::core::Result;
use crate::engine::steps::{proceed, Step};
use crate::engine::Invocation;
use crate::wiring::Configuration;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where AllocOutput takes output buffers from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputAlloc {
    /// Caller-owned transient buffer from the parent state
    Parent,
    /// Cache-owning provider of the current state
    Current,
    /// Reuse the input buffer of the same channel
    InPlace,
}

/// The fixed invocation pipeline of a node, one per meaningful configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    CachingProcess,
    Process { output: OutputAlloc },
    Source,
    CachingSource,
}

const CACHING_PROCESS: &[Step] = &[
    Step::QueryCache,
    Step::AllocBufferTable,
    Step::PullInput,
    Step::AllocOutput,
    Step::ProcessData,
    Step::FeedCache,
    Step::ReleaseBuffers,
];

const PROCESS: &[Step] = &[
    Step::AllocBufferTable,
    Step::PullInput,
    Step::AllocOutput,
    Step::ProcessData,
    Step::ReleaseBuffers,
];

const SOURCE: &[Step] = &[Step::AllocBufferTable, Step::ReadSource, Step::ReleaseBuffers];

// the operation is expected to just copy here
const CACHING_SOURCE: &[Step] = &[
    Step::AllocBufferTable,
    Step::ReadSource,
    Step::AllocOutput,
    Step::ProcessData,
    Step::ReleaseBuffers,
];

impl Strategy {
    /// Pipeline for a flag combination; `None` if the combination is not meaningful
    pub fn for_config(config: Configuration) -> Option<Strategy> {
        let caching = config.contains(Configuration::CACHING);
        let process = config.contains(Configuration::PROCESS);
        let inplace = config.contains(Configuration::INPLACE);
        if config.code() & !Configuration::ALL.code() != 0 {
            return None;
        }

        match (caching, process, inplace) {
            (true, true, _) => Some(Strategy::CachingProcess),
            (false, true, false) => Some(Strategy::Process {
                output: OutputAlloc::Parent,
            }),
            (false, true, true) => Some(Strategy::Process {
                output: OutputAlloc::InPlace,
            }),
            (false, false, _) => Some(Strategy::Source),
            (true, false, false) => Some(Strategy::CachingSource),
            (true, false, true) => None,
        }
    }

    pub fn steps(&self) -> &'static [Step] {
        match self {
            Self::CachingProcess => CACHING_PROCESS,
            Self::Process { .. } => PROCESS,
            Self::Source => SOURCE,
            Self::CachingSource => CACHING_SOURCE,
        }
    }

    pub fn output_alloc(&self) -> Option<OutputAlloc> {
        match self {
            Self::CachingProcess | Self::CachingSource => Some(OutputAlloc::Current),
            Self::Process { output } => Some(*output),
            Self::Source => None,
        }
    }

    pub fn is_source(&self) -> bool {
        matches!(self, Self::Source | Self::CachingSource)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::CachingProcess => "CachingProcess",
            Self::Process {
                output: OutputAlloc::InPlace,
            } => "InPlaceProcess",
            Self::Process { .. } => "Process",
            Self::Source => "Source",
            Self::CachingSource => "CachingSource",
        }
    }

    pub fn run(&self, ivo: &mut Invocation<'_>) -> Result<BufferHandle> {
        proceed(ivo, self.steps())
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let steps: Vec<&str> = self.steps().iter().map(|s| s.name()).collect();
        write!(f, "{}[{}]", self.name(), steps.join("→"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caching_process_ignores_inplace() {
        let plain = Configuration::CACHING | Configuration::PROCESS;
        let inplace = plain | Configuration::INPLACE;
        assert_eq!(Strategy::for_config(plain), Some(Strategy::CachingProcess));
        assert_eq!(Strategy::for_config(inplace), Some(Strategy::CachingProcess));
        assert_eq!(
            Strategy::CachingProcess.output_alloc(),
            Some(OutputAlloc::Current)
        );
    }

    #[test]
    fn test_process_allocation_follows_inplace() {
        let process = Strategy::for_config(Configuration::PROCESS).unwrap();
        let inplace =
            Strategy::for_config(Configuration::PROCESS | Configuration::INPLACE).unwrap();
        assert_eq!(process.output_alloc(), Some(OutputAlloc::Parent));
        assert_eq!(inplace.output_alloc(), Some(OutputAlloc::InPlace));
        assert_eq!(process.steps(), inplace.steps());
    }

    #[test]
    fn test_sources() {
        assert_eq!(Strategy::for_config(Configuration::NONE), Some(Strategy::Source));
        assert_eq!(
            Strategy::for_config(Configuration::INPLACE),
            Some(Strategy::Source)
        );
        assert_eq!(
            Strategy::for_config(Configuration::CACHING),
            Some(Strategy::CachingSource)
        );
        assert_eq!(Strategy::Source.output_alloc(), None);
    }

    #[test]
    fn test_caching_inplace_source_has_no_pipeline() {
        let config = Configuration::CACHING | Configuration::INPLACE;
        assert_eq!(Strategy::for_config(config), None);
        assert_eq!(Strategy::for_config(Configuration::from_code(8)), None);
    }

    #[test]
    fn test_only_caching_process_queries_cache() {
        assert_eq!(Strategy::CachingProcess.steps()[0], Step::QueryCache);
        assert!(!Strategy::CachingSource.steps().contains(&Step::QueryCache));
        assert!(!Strategy::CachingSource.steps().contains(&Step::FeedCache));
        assert_eq!(Strategy::Source.steps().last(), Some(&Step::ReleaseBuffers));
    }
}
