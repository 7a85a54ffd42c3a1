use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// Engine-wide sizing parameters, read from JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Buffer table slots available to one calculation stream
    pub table_capacity: usize,
    /// Frames retained by the frame cache
    pub cache_capacity: usize,
    /// Samples per buffer
    pub frame_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            table_capacity: 1024,
            cache_capacity: 256,
            frame_size: 1024,
        }
    }
}

impl EngineConfig {
    pub fn from_json(config: Value) -> Result<Self> {
        let config: EngineConfig = serde_json::from_value(config)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading engine config {}", path.display()))?;
        Self::from_json(serde_json::from_str(&text)?)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.table_capacity > 0, "table_capacity must be positive");
        ensure!(self.cache_capacity > 0, "cache_capacity must be positive");
        ensure!(self.frame_size > 0, "frame_size must be positive");
        Ok(())
    }
}
