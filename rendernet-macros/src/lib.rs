use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

mod node_meta;
use node_meta::{parse_fields, parse_operation_info, parse_ports, PortField};

/// Derive registry metadata for a node operation and submit it to the
/// operation inventory. The type must implement `Default` and `NodeOperation`.
///
/// Port counts come from the `#[input]` / `#[output]` marker fields.
#[proc_macro_derive(RenderOperation, attributes(operation, param, input, output))]
pub fn derive_render_operation(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let info = match parse_operation_info(&input) {
        Ok(info) => info,
        Err(e) => return e.write_errors().into(),
    };

    let fields = parse_fields(&input);
    let (inputs, outputs) = parse_ports(&input);

    let struct_name = &input.ident;
    let operation_id = info
        .id
        .clone()
        .unwrap_or_else(|| struct_name.to_string().to_lowercase());
    let operation_name = &info.name;
    let category = &info.category;

    let params = fields.iter().filter_map(|f| {
        let field_name = f.ident.as_ref()?.to_string();
        let default_val = f.default.as_ref()?.as_str();
        let type_name = extract_type_name(&f.ty);
        let min = option_tokens(f.min);
        let max = option_tokens(f.max);

        Some(quote! {
            crate::registry::ParameterSchema {
                name: #field_name.to_string(),
                param_type: #type_name.to_string(),
                default: serde_json::from_str(#default_val).unwrap_or(serde_json::Value::Null),
                min: #min,
                max: #max,
            }
        })
    });

    let input_metas = inputs.iter().map(port_tokens);
    let output_metas = outputs.iter().map(port_tokens);

    let mod_name = syn::Ident::new(
        &format!("__operation_registration_{}", struct_name.to_string().to_lowercase()),
        struct_name.span(),
    );

    let expanded = quote! {
        impl #struct_name {
            /// Registry entry of this operation type
            pub fn metadata() -> crate::registry::OperationMetadata {
                crate::registry::OperationMetadata {
                    id: #operation_id.to_string(),
                    name: #operation_name.to_string(),
                    category: #category.to_string(),
                    inputs: vec![#(#input_metas),*],
                    outputs: vec![#(#output_metas),*],
                    parameters: vec![#(#params),*],
                    factory: || Box::new(#struct_name::default()),
                }
            }
        }

        mod #mod_name {
            use super::*;

            fn create_metadata() -> crate::registry::OperationMetadata {
                #struct_name::metadata()
            }

            ::inventory::submit! {
                crate::registry::OperationMetadataFactoryWrapper(create_metadata)
            }
        }
    };

    TokenStream::from(expanded)
}

fn port_tokens(port: &PortField) -> proc_macro2::TokenStream {
    let port_id = port.id();
    let port_name = port.name.clone().unwrap_or_else(|| port_id.clone());
    let data_type = port.data_type.as_deref().unwrap_or("samples");

    quote! {
        crate::registry::PortMetadata {
            id: #port_id.to_string(),
            name: #port_name.to_string(),
            data_type: #data_type.to_string(),
        }
    }
}

fn option_tokens(value: Option<f64>) -> proc_macro2::TokenStream {
    match value {
        Some(v) => quote! { Some(#v) },
        None => quote! { None },
    }
}

fn extract_type_name(ty: &syn::Type) -> &'static str {
    let type_str = quote!(#ty).to_string();

    if type_str.contains("f64") || type_str.contains("f32") {
        "number"
    } else if type_str.contains("u32") || type_str.contains("i32")
        || type_str.contains("u64") || type_str.contains("i64")
        || type_str.contains("usize") || type_str.contains("isize") {
        "number"
    } else if type_str.contains("String") || type_str.contains("str") {
        "string"
    } else if type_str.contains("bool") {
        "boolean"
    } else {
        "unknown"
    }
}
