//! Operation types known by name, collected through `inventory`.

pub mod metadata;

pub use metadata::{
    MetadataFactory, OperationFactory, OperationMetadata, OperationMetadataFactoryWrapper,
    ParameterSchema, PortMetadata,
};

use crate::core::NodeOperation;
use anyhow::{anyhow, Result};
use serde_json::Value;

/// All registered operation types, sorted by id
pub fn all() -> Vec<OperationMetadata> {
    let mut found: Vec<OperationMetadata> = inventory::iter::<OperationMetadataFactoryWrapper>
        .into_iter()
        .map(|wrapper| (wrapper.0)())
        .collect();
    // built-ins are listed even if the linker dropped their registration
    for metadata in crate::nodes::builtin_operations() {
        if !found.iter().any(|m| m.id == metadata.id) {
            found.push(metadata);
        }
    }
    found.sort_by(|a, b| a.id.cmp(&b.id));
    found
}

pub fn find(id: &str) -> Option<OperationMetadata> {
    all().into_iter().find(|m| m.id == id)
}

pub fn create_operation(id: &str, config: Value) -> Result<Box<dyn NodeOperation>> {
    find(id)
        .ok_or(anyhow!("Unknown node type: {}", id))?
        .create_operation(config)
}
