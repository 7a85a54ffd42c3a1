use darling::{FromAttributes, FromField};
use syn::{DeriveInput, Field, Fields};

/// Parsed attributes from #[operation(...)]
#[derive(Debug, FromAttributes)]
#[darling(attributes(operation))]
pub struct OperationArgs {
    pub name: String,
    pub category: String,
    /// Registry id; defaults to the lowercased type name
    #[darling(default)]
    pub id: Option<String>,
}

/// Parsed attributes from #[param(...)]
#[derive(Debug, FromField)]
#[darling(attributes(param))]
pub struct ParamField {
    pub ident: Option<syn::Ident>,
    pub ty: syn::Type,

    #[darling(default)]
    pub default: Option<String>,

    #[darling(default)]
    pub min: Option<f64>,

    #[darling(default)]
    pub max: Option<f64>,
}

/// Port marker fields, #[input(...)] or #[output(...)]
#[derive(Debug, FromField)]
#[darling(attributes(input, output))]
pub struct PortField {
    pub ident: Option<syn::Ident>,

    #[darling(default)]
    pub name: Option<String>,

    #[darling(default)]
    pub data_type: Option<String>,
}

impl PortField {
    pub fn id(&self) -> String {
        self.ident
            .as_ref()
            .map(|ident| ident.to_string().trim_start_matches('_').to_string())
            .unwrap_or_default()
    }
}

pub fn parse_operation_info(input: &DeriveInput) -> darling::Result<OperationArgs> {
    OperationArgs::from_attributes(&input.attrs)
}

fn named_fields(input: &DeriveInput) -> Vec<&Field> {
    match &input.data {
        syn::Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => fields.named.iter().collect(),
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

pub fn parse_fields(input: &DeriveInput) -> Vec<ParamField> {
    named_fields(input)
        .into_iter()
        .filter(|f| f.attrs.iter().any(|attr| attr.path().is_ident("param")))
        .filter_map(|f| ParamField::from_field(f).ok())
        .collect()
}

/// Input and output marker fields, in declaration order
pub fn parse_ports(input: &DeriveInput) -> (Vec<PortField>, Vec<PortField>) {
    let mut inputs = Vec::new();
    let mut outputs = Vec::new();

    for field in named_fields(input) {
        if field.attrs.iter().any(|attr| attr.path().is_ident("input")) {
            if let Ok(port) = PortField::from_field(field) {
                inputs.push(port);
            }
        }
        if field.attrs.iter().any(|attr| attr.path().is_ident("output")) {
            if let Ok(port) = PortField::from_field(field) {
                outputs.push(port);
            }
        }
    }

    (inputs, outputs)
}
