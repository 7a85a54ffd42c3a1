use crate::core::{FrameId, NodeOperation};
use anyhow::Result;
use rendernet_macros::RenderOperation;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::f64::consts::PI;

/// Source reading a sine wave; frame `n` covers samples `n * len .. (n + 1) * len`
#[derive(RenderOperation, Debug, Clone, Serialize, Deserialize)]
#[operation(name = "Sine Generator", category = "Sources")]
pub struct SineGenerator {
    #[output(name = "Signal")]
    _output: (),

    #[param(default = "440.0", min = 0.0, max = 24000.0)]
    pub frequency: f64,

    #[param(default = "48000.0", min = 1.0)]
    pub sample_rate: f64,

    #[param(default = "1.0", min = 0.0, max = 1.0)]
    pub amplitude: f64,
}

impl Default for SineGenerator {
    fn default() -> Self {
        Self {
            _output: (),
            frequency: 440.0,
            sample_rate: 48000.0,
            amplitude: 1.0,
        }
    }
}

impl SineGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NodeOperation for SineGenerator {
    fn on_create(&mut self, config: Value) -> Result<()> {
        if let Some(freq) = config["frequency"].as_f64() {
            self.frequency = freq;
        }
        if let Some(sr) = config["sample_rate"].as_f64() {
            anyhow::ensure!(sr > 0.0, "sample_rate must be positive, got {}", sr);
            self.sample_rate = sr;
        }
        if let Some(amp) = config["amplitude"].as_f64() {
            self.amplitude = amp;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "SineGenerator"
    }

    fn read_source(&self, frame: &FrameId, buffer: &mut [f64]) -> Result<()> {
        let phase_increment = 2.0 * PI * self.frequency / self.sample_rate;
        let start = frame.frame * buffer.len() as i64;

        for (i, sample) in buffer.iter_mut().enumerate() {
            let n = (start + i as i64) as f64;
            *sample = self.amplitude * (n * phase_increment).sin();
        }
        Ok(())
    }
}
