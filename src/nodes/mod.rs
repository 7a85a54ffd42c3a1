pub mod function;
pub mod gain;
pub mod mix;
pub mod passthrough;
pub mod sine_generator;

pub use function::FnOperation;
pub use gain::Gain;
pub use mix::Mix;
pub use passthrough::Passthrough;
pub use sine_generator::SineGenerator;

use crate::registry::OperationMetadata;

/// Metadata of the operations shipped with the crate
pub fn builtin_operations() -> Vec<OperationMetadata> {
    vec![
        Passthrough::metadata(),
        Gain::metadata(),
        Mix::metadata(),
        SineGenerator::metadata(),
    ]
}
