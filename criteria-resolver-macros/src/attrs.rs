//! Attribute parsing helpers shared by the derives

use proc_macro2::Span;
use syn::punctuated::Punctuated;
use syn::token::Comma;
use syn::{Data, DeriveInput, Field, Fields, Ident, LitStr};

/// Comparison names accepted by `#[criteria(comparison = "...")]`
const COMPARISONS: &[(&str, &str)] = &[
    ("equals", "Equals"),
    ("like", "Like"),
    ("starts_with", "StartsWith"),
    ("ends_with", "EndsWith"),
    ("greater_than", "GreaterThan"),
    ("greater_equals", "GreaterEquals"),
    ("less_than", "LessThan"),
    ("less_equals", "LessEquals"),
    ("in", "In"),
    ("not_in", "NotIn"),
    ("different", "Different"),
];

const JOIN_KINDS: &[(&str, &str)] = &[("inner", "Inner"), ("left", "Left"), ("right", "Right")];

/// Named fields of a struct, or an error naming the derive.
pub(crate) fn named_fields<'a>(
    input: &'a DeriveInput,
    derive: &str,
) -> syn::Result<&'a Punctuated<Field, Comma>> {
    match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => Ok(&fields.named),
            _ => Err(syn::Error::new_spanned(
                &input.ident,
                format!("{} can only be derived for structs with named fields", derive),
            )),
        },
        _ => Err(syn::Error::new_spanned(
            &input.ident,
            format!("{} can only be derived for structs", derive),
        )),
    }
}

/// Field identifier; always present for named fields.
pub(crate) fn field_ident(field: &Field) -> syn::Result<&Ident> {
    field
        .ident
        .as_ref()
        .ok_or_else(|| syn::Error::new_spanned(field, "expected a named field"))
}

/// Check a dotted attribute path: non-empty identifier segments.
pub(crate) fn validate_path(lit: &LitStr) -> syn::Result<String> {
    let path = lit.value();
    let well_formed = path.split('.').all(|segment| {
        let mut chars = segment.chars();
        matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic())
            && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
    });

    if well_formed {
        Ok(path)
    } else {
        Err(syn::Error::new(
            lit.span(),
            format!("malformed attribute path `{}`", path),
        ))
    }
}

pub(crate) fn comparison_variant(lit: &LitStr) -> syn::Result<Ident> {
    lookup_variant(lit, COMPARISONS, "comparison")
}

pub(crate) fn join_kind_variant(lit: &LitStr) -> syn::Result<Ident> {
    lookup_variant(lit, JOIN_KINDS, "join kind")
}

fn lookup_variant(lit: &LitStr, table: &[(&str, &str)], what: &str) -> syn::Result<Ident> {
    let value = lit.value().to_ascii_lowercase();
    table
        .iter()
        .find(|(name, _)| *name == value)
        .map(|(_, variant)| Ident::new(variant, Span::call_site()))
        .ok_or_else(|| {
            let expected: Vec<&str> = table.iter().map(|(name, _)| *name).collect();
            syn::Error::new(
                lit.span(),
                format!(
                    "unknown {} `{}`, expected one of: {}",
                    what,
                    lit.value(),
                    expected.join(", ")
                ),
            )
        })
}

/// `Some("path")` or `None` as tokens
pub(crate) fn optional_str(value: &Option<String>) -> proc_macro2::TokenStream {
    match value {
        Some(value) => quote::quote! { ::std::option::Option::Some(#value) },
        None => quote::quote! { ::std::option::Option::None },
    }
}
