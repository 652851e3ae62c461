//! `#[derive(SearchObject)]`

use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Ident, LitStr, Meta};

use crate::attrs::{
    comparison_variant, field_ident, join_kind_variant, named_fields, optional_str, validate_path,
};

/// One `#[criteria]` field
struct CriteriaField {
    ident: Ident,
    target_path: Option<String>,
    comparison: Ident,
}

/// One `#[search_object(join(...))]` entry
struct JoinEntry {
    path: String,
    kind: Ident,
}

pub(crate) fn expand(input: DeriveInput) -> syn::Result<TokenStream> {
    let fields = parse_fields(&input)?;
    let joins = parse_joins(&input)?;

    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let len = fields.len();

    let specs = fields.iter().map(|field| {
        let source = field.ident.to_string();
        let target = optional_str(&field.target_path);
        let comparison = &field.comparison;
        quote! {
            ::criteria_resolver::FieldSpec {
                source_field: #source,
                target_path: #target,
                comparison: ::criteria_resolver::ComparisonKind::#comparison,
            }
        }
    });

    let pushes = fields.iter().enumerate().map(|(i, field)| {
        let ident = &field.ident;
        quote! {
            if let ::std::option::Option::Some(value) =
                ::criteria_resolver::FieldValue::criteria_value(&self.#ident)
            {
                criteria.push(::criteria_resolver::Criterion { spec: &specs[#i], value });
            }
        }
    });

    let criteria_body = if fields.is_empty() {
        quote! { ::std::vec::Vec::new() }
    } else {
        quote! {
            let specs = <Self as ::criteria_resolver::SearchObject>::field_specs();
            let mut criteria = ::std::vec::Vec::new();
            #(#pushes)*
            criteria
        }
    };

    let joins_fn = if joins.is_empty() {
        quote! {}
    } else {
        let inserts = joins.iter().map(|join| {
            let path = &join.path;
            let kind = &join.kind;
            quote! { spec.insert(#path, ::criteria_resolver::JoinKind::#kind); }
        });
        quote! {
            fn joins(&self) -> ::criteria_resolver::JoinSpec {
                let mut spec = ::criteria_resolver::JoinSpec::new();
                #(#inserts)*
                spec
            }
        }
    };

    Ok(quote! {
        impl #impl_generics ::criteria_resolver::SearchObject for #name #ty_generics #where_clause {
            fn field_specs() -> &'static [::criteria_resolver::FieldSpec] {
                static SPECS: [::criteria_resolver::FieldSpec; #len] = [#(#specs),*];
                &SPECS
            }

            fn criteria(&self) -> ::std::vec::Vec<::criteria_resolver::Criterion> {
                #criteria_body
            }

            #joins_fn
        }
    })
}

fn parse_fields(input: &DeriveInput) -> syn::Result<Vec<CriteriaField>> {
    let mut parsed = Vec::new();

    for field in named_fields(input, "SearchObject")? {
        let mut attrs = field.attrs.iter().filter(|attr| attr.path().is_ident("criteria"));
        let Some(attr) = attrs.next() else {
            continue;
        };
        if let Some(duplicate) = attrs.next() {
            return Err(syn::Error::new_spanned(
                duplicate,
                "duplicate #[criteria] attribute; a field maps to one criterion",
            ));
        }

        let mut target_path = None;
        let mut comparison = Ident::new("Equals", proc_macro2::Span::call_site());

        // Bare `#[criteria]` keeps every default
        if !matches!(attr.meta, Meta::Path(_)) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("path") {
                    let lit: LitStr = meta.value()?.parse()?;
                    target_path = Some(validate_path(&lit)?);
                    Ok(())
                } else if meta.path.is_ident("comparison") {
                    let lit: LitStr = meta.value()?.parse()?;
                    comparison = comparison_variant(&lit)?;
                    Ok(())
                } else {
                    Err(meta.error("expected `path` or `comparison`"))
                }
            })?;
        }

        parsed.push(CriteriaField {
            ident: field_ident(field)?.clone(),
            target_path,
            comparison,
        });
    }

    Ok(parsed)
}

fn parse_joins(input: &DeriveInput) -> syn::Result<Vec<JoinEntry>> {
    let mut joins = Vec::new();

    for attr in input.attrs.iter().filter(|attr| attr.path().is_ident("search_object")) {
        attr.parse_nested_meta(|meta| {
            if !meta.path.is_ident("join") {
                return Err(meta.error("expected `join(path = \"...\", kind = \"...\")`"));
            }

            let mut path = None;
            let mut kind = Ident::new("Inner", proc_macro2::Span::call_site());
            meta.parse_nested_meta(|inner| {
                if inner.path.is_ident("path") {
                    let lit: LitStr = inner.value()?.parse()?;
                    path = Some(validate_path(&lit)?);
                    Ok(())
                } else if inner.path.is_ident("kind") {
                    let lit: LitStr = inner.value()?.parse()?;
                    kind = join_kind_variant(&lit)?;
                    Ok(())
                } else {
                    Err(inner.error("expected `path` or `kind`"))
                }
            })?;

            let path = path.ok_or_else(|| meta.error("join requires a `path`"))?;
            joins.push(JoinEntry { path, kind });
            Ok(())
        })?;
    }

    Ok(joins)
}
