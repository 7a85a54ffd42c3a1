use crate::core::FrameId;
use crate::engine::FeedManifold;
use anyhow::{bail, Result};
use serde_json::Value;

/// The data processing function embodied by a node.
///
/// Operations are configured once from JSON, then shared read-only by every
/// calculation stream pulling the network.
pub trait NodeOperation: Send + Sync {
    /// Called once when the operation is instantiated with config from JSON
    fn on_create(&mut self, _config: Value) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str;

    /// Compute all outputs from the inputs of the feed.
    ///
    /// Default copies input channel `i` to output channel `i`, which is what
    /// a caching source needs to move freshly read data into cache buffers.
    fn process(&self, feed: &mut FeedManifold<'_>) -> Result<()> {
        let channels = feed.nr_outputs().min(feed.nr_inputs());
        for ch in 0..channels {
            feed.apply(ch, ch, |sample| sample);
        }
        Ok(())
    }

    /// Fill `buffer` with raw data for one channel of a source node
    fn read_source(&self, frame: &FrameId, _buffer: &mut [f64]) -> Result<()> {
        bail!("{} can not read source data ({})", self.name(), frame)
    }
}
