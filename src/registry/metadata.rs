use crate::core::NodeOperation;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Metadata describing a port (input or output)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortMetadata {
    pub id: String,
    pub name: String,
    pub data_type: String,
}

/// Schema for a configurable parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: String,
    pub default: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// Factory function type for creating operation instances
pub type OperationFactory = fn() -> Box<dyn NodeOperation>;

/// Complete metadata for an operation type; port counts determine the
/// wiring of nodes using it.
#[derive(Clone, Serialize)]
pub struct OperationMetadata {
    pub id: String,
    pub name: String,
    pub category: String,
    pub inputs: Vec<PortMetadata>,
    pub outputs: Vec<PortMetadata>,
    pub parameters: Vec<ParameterSchema>,
    #[serde(skip)]
    pub factory: OperationFactory,
}

impl OperationMetadata {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: impl Into<String>,
        factory: OperationFactory,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: category.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            parameters: Vec::new(),
            factory,
        }
    }

    pub fn add_input(
        mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        data_type: impl Into<String>,
    ) -> Self {
        self.inputs.push(PortMetadata {
            id: id.into(),
            name: name.into(),
            data_type: data_type.into(),
        });
        self
    }

    pub fn add_output(
        mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        data_type: impl Into<String>,
    ) -> Self {
        self.outputs.push(PortMetadata {
            id: id.into(),
            name: name.into(),
            data_type: data_type.into(),
        });
        self
    }

    pub fn add_parameter(mut self, param: ParameterSchema) -> Self {
        self.parameters.push(param);
        self
    }

    /// Instantiate the operation and configure it
    pub fn create_operation(&self, config: Value) -> Result<Box<dyn NodeOperation>> {
        let mut operation = (self.factory)();
        operation.on_create(config)?;
        Ok(operation)
    }
}

impl std::fmt::Debug for OperationMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationMetadata")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("inputs", &self.inputs.len())
            .field("outputs", &self.outputs.len())
            .finish()
    }
}

// Factory type for creating operation metadata at runtime
pub type MetadataFactory = fn() -> OperationMetadata;

// Wrapper for inventory collection
pub struct OperationMetadataFactoryWrapper(pub MetadataFactory);

inventory::collect!(OperationMetadataFactoryWrapper);
