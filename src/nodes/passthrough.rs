use crate::core::NodeOperation;
use rendernet_macros::RenderOperation;
use serde::{Deserialize, Serialize};

/// Forwards its input; the default processing copies input to output
#[derive(RenderOperation, Debug, Clone, Default, Serialize, Deserialize)]
#[operation(name = "Passthrough", category = "Utility")]
pub struct Passthrough {
    #[input(name = "In")]
    _input: (),

    #[output(name = "Out")]
    _output: (),
}

impl NodeOperation for Passthrough {
    fn name(&self) -> &str {
        "Passthrough"
    }
}
