use crate::core::NodeOperation;
use crate::engine::FeedManifold;
use anyhow::Result;
use rendernet_macros::RenderOperation;
use serde::{Deserialize, Serialize};

/// Scales every channel; suited for in-place wiring
#[derive(RenderOperation, Debug, Clone, Serialize, Deserialize)]
#[operation(name = "Gain", category = "Processors")]
pub struct Gain {
    #[input(name = "Signal In")]
    _input: (),

    #[output(name = "Signal Out")]
    _output: (),

    #[param(default = "0.0", min = "-60.0", max = 20.0)]
    pub gain_db: f64,

    #[serde(skip)]
    gain_linear: f64,
}

impl Default for Gain {
    fn default() -> Self {
        Self {
            _input: (),
            _output: (),
            gain_db: 0.0,
            gain_linear: 1.0,
        }
    }
}

impl Gain {
    pub fn new(gain_db: f64) -> Self {
        Self {
            gain_db,
            gain_linear: 10_f64.powf(gain_db / 20.0),
            ..Self::default()
        }
    }

    pub fn linear(&self) -> f64 {
        self.gain_linear
    }
}

impl NodeOperation for Gain {
    fn on_create(&mut self, config: serde_json::Value) -> Result<()> {
        if let Some(gain_db) = config.get("gain_db").and_then(|v| v.as_f64()) {
            self.gain_db = gain_db;
        }

        // Convert dB to linear
        self.gain_linear = 10_f64.powf(self.gain_db / 20.0);

        Ok(())
    }

    fn name(&self) -> &str {
        "Gain"
    }

    fn process(&self, feed: &mut FeedManifold<'_>) -> Result<()> {
        let gain = self.gain_linear;
        for ch in 0..feed.nr_outputs() {
            feed.apply(ch, ch, |sample| sample * gain);
        }
        Ok(())
    }
}
