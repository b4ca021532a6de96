//! Derive macros for mapforge.
//!
//! - `Reflect`: implements `mapforge_runtime::FieldValue` and `mapforge_runtime::Reflect` for a struct with named
//!   fields, so the compiler can read its metadata and mappers can convert it to and from records.
//!
//! ## Attributes
//!
//! - `#[reflect(namespace = "app::entities")]` on the struct overrides the namespace. Without it the namespace is
//!   the struct's module path minus the crate name.
//! - `#[reflect(readonly)]` / `#[reflect(writeonly)]` on a field clear the matching access flag.

use proc_macro::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::{Data, DeriveInput, Fields, GenericParam, LitStr, parse_macro_input, parse_quote};

/// Generates `FieldValue` and `Reflect` implementations.
///
/// # Example
/// ```ignore
/// #[derive(Reflect)]
/// #[reflect(namespace = "app::entities")]
/// struct User {
///     name: String,
///     #[reflect(readonly)]
///     id: i64,
/// }
///
/// // User::compiled_type() describes `app::entities::User { name: str, readonly id: int }`
/// ```
#[proc_macro_derive(Reflect, attributes(reflect))]
pub fn derive_reflect(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_reflect(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

struct FieldSpec {
    ident: syn::Ident,
    /// Property name; raw identifiers (`r#type`) lose their prefix.
    name: String,
    ty: syn::Type,
    readable: bool,
    writable: bool,
}

fn expand_reflect(mut input: DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = input.ident.clone();
    let name_str = name.to_string();

    let mut namespace: Option<LitStr> = None;
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("reflect")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("namespace") {
                namespace = Some(meta.value()?.parse()?);
                Ok(())
            } else {
                Err(meta.error("unsupported reflect attribute on a struct"))
            }
        })?;
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => fields
                .named
                .iter()
                .map(field_spec)
                .collect::<syn::Result<Vec<_>>>()?,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "Reflect can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "Reflect can only be derived for structs",
            ));
        }
    };

    let type_params: Vec<String> = input
        .generics
        .params
        .iter()
        .filter_map(|p| match p {
            GenericParam::Type(t) => Some(t.ident.to_string()),
            _ => None,
        })
        .collect();

    for param in input.generics.params.iter_mut() {
        if let GenericParam::Type(t) = param {
            t.bounds.push(parse_quote!(::mapforge_runtime::FieldValue));
        }
    }
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let namespace_expr = match namespace {
        Some(lit) => quote!(#lit),
        None => quote!(::mapforge_runtime::reflect::namespace_of(module_path!())),
    };

    let props = fields.iter().map(|f| {
        let field_name = &f.name;
        let ty = &f.ty;
        let readable = f.readable;
        let writable = f.writable;
        quote! {
            ::mapforge_runtime::CompiledProperty {
                name: #field_name.to_string(),
                ty: <#ty as ::mapforge_runtime::FieldValue>::type_name(),
                readable: #readable,
                writable: #writable,
            }
        }
    });

    let to_fields = fields.iter().map(|f| {
        let ident = &f.ident;
        let field_name = &f.name;
        quote! {
            (#field_name.to_string(), ::mapforge_runtime::FieldValue::to_value(&self.#ident))
        }
    });

    let from_fields = fields.iter().map(|f| {
        let ident = &f.ident;
        let field_name = &f.name;
        quote! {
            #ident: ::mapforge_runtime::reflect::take_field(&mut record, #field_name)?
        }
    });

    Ok(quote! {
        impl #impl_generics ::mapforge_runtime::FieldValue for #name #ty_generics #where_clause {
            fn type_name() -> String {
                ::mapforge_runtime::reflect::qualify(#namespace_expr, #name_str)
            }

            fn to_value(&self) -> ::mapforge_runtime::Value {
                ::mapforge_runtime::Value::Record(::mapforge_runtime::Reflect::to_record(self))
            }

            fn from_value(
                value: ::mapforge_runtime::Value,
            ) -> ::std::result::Result<Self, ::mapforge_runtime::ConvertError> {
                match value {
                    ::mapforge_runtime::Value::Record(record) => {
                        <Self as ::mapforge_runtime::Reflect>::from_record(record)
                    }
                    other => ::std::result::Result::Err(::mapforge_runtime::ConvertError::Mismatch {
                        expected: <Self as ::mapforge_runtime::FieldValue>::type_name(),
                        found: other.kind(),
                    }),
                }
            }
        }

        impl #impl_generics ::mapforge_runtime::Reflect for #name #ty_generics #where_clause {
            fn compiled_type() -> ::mapforge_runtime::CompiledType {
                ::mapforge_runtime::CompiledType {
                    name: #name_str.to_string(),
                    namespace: (#namespace_expr).to_string(),
                    type_params: vec![#(#type_params.to_string()),*],
                    properties: vec![#(#props),*],
                    methods: Vec::new(),
                }
            }

            fn to_record(&self) -> ::mapforge_runtime::Record {
                ::mapforge_runtime::Record {
                    type_name: <Self as ::mapforge_runtime::FieldValue>::type_name(),
                    fields: vec![#(#to_fields),*],
                }
            }

            #[allow(unused_mut)]
            fn from_record(
                mut record: ::mapforge_runtime::Record,
            ) -> ::std::result::Result<Self, ::mapforge_runtime::ConvertError> {
                ::std::result::Result::Ok(Self {
                    #(#from_fields),*
                })
            }
        }
    })
}

fn field_spec(field: &syn::Field) -> syn::Result<FieldSpec> {
    let mut readable = true;
    let mut writable = true;
    for attr in field.attrs.iter().filter(|a| a.path().is_ident("reflect")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("readonly") {
                writable = false;
                Ok(())
            } else if meta.path.is_ident("writeonly") {
                readable = false;
                Ok(())
            } else {
                Err(meta.error("expected `readonly` or `writeonly`"))
            }
        })?;
    }
    let ident = field
        .ident
        .clone()
        .ok_or_else(|| syn::Error::new_spanned(field, "expected a named field"))?;
    Ok(FieldSpec {
        name: ident.unraw().to_string(),
        ident,
        ty: field.ty.clone(),
        readable,
        writable,
    })
}
