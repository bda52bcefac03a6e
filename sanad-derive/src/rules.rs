//! Builtin validation rules.
//!
//! Each rule expands to a block that returns `Err(E::from(message))` when the
//! field does not satisfy it. `E` is the error alias declared by the derived
//! constructor.

use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::Ident;

pub(crate) fn dispatch(rule: &str, value: &Ident) -> Option<TokenStream2> {
    match rule {
        "non_empty" => Some(non_empty(value)),
        "printable_string" => Some(printable_string(value)),
        "is_country_code" => Some(is_country_code(value)),
        _ => None,
    }
}

fn non_empty(value: &Ident) -> TokenStream2 {
    quote! {
        if #value.trim().is_empty() {
            return Err(E::from(format!("{} must be non-empty", stringify!(#value))));
        }
    }
}

/// ASN.1 PrintableString alphabet.
fn printable_string(value: &Ident) -> TokenStream2 {
    quote! {
        if let Some(c) = #value.chars().find(|c| {
            !(c.is_ascii_alphanumeric() || " '()+,-./:=?".contains(*c))
        }) {
            return Err(E::from(format!(
                "{} contains character {:?} outside the PrintableString set",
                stringify!(#value),
                c
            )));
        }
    }
}

fn is_country_code(value: &Ident) -> TokenStream2 {
    quote! {
        if #value.len() != 2 || !#value.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(E::from(format!(
                "{} must be a two-letter ISO 3166 country code",
                stringify!(#value)
            )));
        }
    }
}
