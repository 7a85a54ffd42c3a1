use crate::core::NodeOperation;
use crate::engine::FeedManifold;
use anyhow::{ensure, Result};
use rendernet_macros::RenderOperation;
use serde::{Deserialize, Serialize};

/// Weighted sum of two signals
#[derive(RenderOperation, Debug, Clone, Serialize, Deserialize)]
#[operation(name = "Mix", category = "Processors")]
pub struct Mix {
    #[input(name = "Left")]
    _a: (),

    #[input(name = "Right")]
    _b: (),

    #[output(name = "Sum")]
    _output: (),

    #[param(default = "0.5", min = 0.0, max = 1.0)]
    pub balance: f64,
}

impl Default for Mix {
    fn default() -> Self {
        Self {
            _a: (),
            _b: (),
            _output: (),
            balance: 0.5,
        }
    }
}

impl NodeOperation for Mix {
    fn on_create(&mut self, config: serde_json::Value) -> Result<()> {
        if let Some(balance) = config["balance"].as_f64() {
            ensure!((0.0..=1.0).contains(&balance), "balance out of range: {}", balance);
            self.balance = balance;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "Mix"
    }

    fn process(&self, feed: &mut FeedManifold<'_>) -> Result<()> {
        ensure!(feed.nr_inputs() == 2, "Mix needs two inputs, got {}", feed.nr_inputs());
        let (wa, wb) = (1.0 - self.balance, self.balance);
        feed.with_inputs(0, |inputs, out| {
            for (i, sample) in out.iter_mut().enumerate() {
                *sample = wa * inputs[0][i] + wb * inputs[1][i];
            }
        });
        Ok(())
    }
}
