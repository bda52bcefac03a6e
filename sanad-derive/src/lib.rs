//! `#[derive(Validate)]` generates a `new` constructor that checks string
//! fields against named rules before building the struct.
//!
//! Rules listed on the struct apply to every `String` field that does not
//! carry its own `#[validate(..)]`; `#[validate(skip)]` opts a field out.
//! The error type comes from `#[validate_error(Type)]` and must implement
//! `From<String>`.
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{quote, ToTokens};
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields, Type};

mod rules;

fn extract_error_type(attrs: &[Attribute]) -> syn::Result<TokenStream2> {
    for attr in attrs.iter().filter(|a| a.path().is_ident("validate_error")) {
        let mut ty = None;
        attr.parse_nested_meta(|meta| {
            ty = Some(meta.path.to_token_stream());
            Ok(())
        })?;
        if let Some(t) = ty {
            return Ok(t);
        }
    }
    Ok(quote! { String })
}

fn extract_rules(attrs: &[Attribute]) -> syn::Result<Vec<String>> {
    let mut out = vec![];
    for attr in attrs.iter().filter(|a| a.path().is_ident("validate")) {
        attr.parse_nested_meta(|meta| {
            if let Some(id) = meta.path.get_ident() {
                out.push(id.to_string());
            }
            Ok(())
        })?;
    }
    Ok(out)
}

/// Only allow rules on String for now.
fn is_string_type(ty: &Type) -> bool {
    match ty {
        Type::Path(p) => p
            .path
            .segments
            .last()
            .map(|s| s.ident == "String")
            .unwrap_or(false),
        _ => false,
    }
}

#[proc_macro_derive(Validate, attributes(validate, validate_error))]
pub fn derive_validate(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    match expand(ast) {
        Ok(ts) => ts.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(ast: DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();
    let error_type = extract_error_type(&ast.attrs)?;
    let struct_rules = extract_rules(&ast.attrs)?;

    let fields = match ast.data {
        Data::Struct(s) => match s.fields {
            Fields::Named(n) => n.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &struct_name,
                    "Validate supports named structs only",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &struct_name,
                "Validate can only be used on structs",
            ))
        }
    };

    let mut ctor_params = vec![];
    let mut ctor_assigns = vec![];
    let mut validations = vec![];

    for field in fields {
        let Some(ident) = field.ident else {
            continue;
        };
        let ty = field.ty;

        ctor_params.push(quote! { #ident: #ty });
        ctor_assigns.push(quote! { #ident });

        let own_rules = extract_rules(&field.attrs)?;
        if own_rules.iter().any(|r| r == "skip") {
            continue;
        }
        let explicit = !own_rules.is_empty();
        let field_rules = if explicit {
            own_rules
        } else {
            struct_rules.clone()
        };
        if field_rules.is_empty() {
            continue;
        }

        if !is_string_type(&ty) {
            // struct-level rules quietly pass over non-string fields
            if !explicit {
                continue;
            }
            return Err(syn::Error::new_spanned(
                &ty,
                format!("validation rules can only be applied to String fields: {ident}"),
            ));
        }

        for rule in field_rules {
            match rules::dispatch(&rule, &ident) {
                Some(ts) => validations.push(ts),
                None => {
                    return Err(syn::Error::new_spanned(
                        &ident,
                        format!("unknown validation rule `{rule}`"),
                    ))
                }
            }
        }
    }

    Ok(quote! {
        impl #impl_generics #struct_name #ty_generics #where_clause {
            pub fn new(
                #(#ctor_params),*
            ) -> ::core::result::Result<Self, #error_type> {
                #[allow(dead_code)]
                type E = #error_type;

                #(
                    #validations
                )*

                Ok(Self {
                    #(#ctor_assigns),*
                })
            }
        }
    })
}
