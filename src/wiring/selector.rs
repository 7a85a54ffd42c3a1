use crate::core::{EngineError, Result};
use crate::engine::Strategy;
use crate::wiring::{Configuration, DescriptorId, NodeNetwork, WiringDescriptor, WiringSpec};
use log::debug;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Builds the descriptor for one configuration inside the given network segment
pub type WiringFn =
    Arc<dyn Fn(&mut NodeNetwork, &WiringSpec) -> Result<DescriptorId> + Send + Sync>;

/// Dispatch table from configuration code to the factory wiring nodes of
/// that configuration with its frozen strategy pipeline.
///
/// Built once at graph construction; lookups of an unregistered code fail
/// with [`EngineError::InvalidConfig`].
#[derive(Clone)]
pub struct ConfigSelector {
    table: BTreeMap<u8, (Strategy, WiringFn)>,
}

impl ConfigSelector {
    /// Register a factory for each configuration. Every configuration given
    /// must be backed by a strategy pipeline.
    pub fn new(configs: impl IntoIterator<Item = Configuration>) -> Result<Self> {
        let mut table = BTreeMap::new();
        for config in configs {
            let strategy = Strategy::for_config(config).ok_or(EngineError::InvalidConfig {
                code: config.code(),
            })?;
            table.insert(config.code(), (strategy, Self::factory_for(config, strategy)));
        }
        debug!("config selector with {} entries", table.len());
        Ok(Self { table })
    }

    /// Selector covering every flag combination which has a pipeline
    pub fn meaningful() -> Self {
        let table = Configuration::all_combinations()
            .filter_map(|config| {
                Strategy::for_config(config).map(|strategy| {
                    (config.code(), (strategy, Self::factory_for(config, strategy)))
                })
            })
            .collect();
        Self { table }
    }

    fn factory_for(config: Configuration, strategy: Strategy) -> WiringFn {
        Arc::new(move |network: &mut NodeNetwork, spec: &WiringSpec| {
            let descriptor = WiringDescriptor::new(
                spec.nr_out,
                spec.nr_in,
                Arc::clone(&spec.operation),
                config,
                strategy,
                spec.buffer_size,
            );
            Ok(network.add_wiring(descriptor))
        })
    }

    pub fn get(&self, code: u8) -> Result<&WiringFn> {
        self.table
            .get(&code)
            .map(|(_, factory)| factory)
            .ok_or(EngineError::InvalidConfig { code })
    }

    pub fn strategy_for(&self, code: u8) -> Result<Strategy> {
        self.table
            .get(&code)
            .map(|(strategy, _)| *strategy)
            .ok_or(EngineError::InvalidConfig { code })
    }

    pub fn codes(&self) -> impl Iterator<Item = u8> + '_ {
        self.table.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl fmt::Debug for ConfigSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.table.iter().map(|(code, (strategy, _))| (code, strategy.name())))
            .finish()
    }
}
