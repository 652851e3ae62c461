//! `#[derive(Projection)]`

use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Field, Ident, LitStr};

use crate::attrs::{field_ident, named_fields, optional_str, validate_path};

struct ProjectedField {
    ident: Ident,
    target_path: Option<String>,
}

pub(crate) fn expand(input: DeriveInput) -> syn::Result<TokenStream> {
    let fields = named_fields(&input, "Projection")?
        .iter()
        .map(parse_field)
        .collect::<syn::Result<Vec<_>>>()?;

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let len = fields.len();

    let specs = fields.iter().map(|field| {
        let source = field.ident.to_string();
        let target = optional_str(&field.target_path);
        quote! {
            ::criteria_resolver::ProjectionSpec {
                source_field: #source,
                target_path: #target,
            }
        }
    });

    let idents: Vec<&Ident> = fields.iter().map(|field| &field.ident).collect();
    let from_row = from_row_impl(&input, &idents);

    Ok(quote! {
        #from_row

        impl #impl_generics ::criteria_resolver::Projection for #name #ty_generics #where_clause {
            fn projection_specs() -> &'static [::criteria_resolver::ProjectionSpec] {
                static SPECS: [::criteria_resolver::ProjectionSpec; #len] = [#(#specs),*];
                &SPECS
            }
        }
    })
}

fn parse_field(field: &Field) -> syn::Result<ProjectedField> {
    let mut target_path = None;

    for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("projection")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("path") {
                let lit: LitStr = meta.value()?.parse()?;
                target_path = Some(validate_path(&lit)?);
                Ok(())
            } else {
                Err(meta.error("expected `path`"))
            }
        })?;
    }

    Ok(ProjectedField {
        ident: field_ident(field)?.clone(),
        target_path,
    })
}

/// Positional row decoding, one column per field in declaration order.
pub(crate) fn from_row_impl(input: &DeriveInput, idents: &[&Ident]) -> TokenStream {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let indexes = 0..idents.len();

    quote! {
        impl #impl_generics ::criteria_resolver::FromSqlRow for #name #ty_generics #where_clause {
            fn from_row(
                row: &::criteria_resolver::sqlx::sqlite::SqliteRow,
            ) -> ::std::result::Result<Self, ::criteria_resolver::sqlx::Error> {
                ::std::result::Result::Ok(Self {
                    #(#idents: ::criteria_resolver::sqlx::Row::try_get(row, #indexes)?,)*
                })
            }
        }
    }
}
