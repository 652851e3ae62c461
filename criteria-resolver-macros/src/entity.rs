//! `#[derive(Entity)]`
//!
//! Emits a static [`EntityMeta`] describing the table, its scalar columns
//! and its associations, plus positional row decoding for whole-entity
//! selections.
//!
//! Defaults when not given explicitly:
//! - table: snake_case of the struct name plus `s` (`Employee` -> `employees`)
//! - primary key: the `#[primary_key]` field, else a field named `id`
//! - `belongs_to` foreign key: `{association}_id`, on this table
//! - `has_many` foreign key: `{snake_case(struct)}_id`, on the target table

use convert_case::{Case, Casing};
use proc_macro2::TokenStream;
use quote::quote;
use syn::{Attribute, DeriveInput, Ident, LitStr, Path, Token};

use crate::attrs::{field_ident, named_fields};
use crate::projection::from_row_impl;

struct Column {
    ident: Ident,
    column: String,
    primary_key: bool,
}

enum AssociationKind {
    BelongsTo,
    HasMany,
}

struct Association {
    kind: AssociationKind,
    name: String,
    target: Path,
    foreign_key: String,
}

pub(crate) fn expand(input: DeriveInput) -> syn::Result<TokenStream> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Entity cannot be derived for generic structs",
        ));
    }

    let name = &input.ident;
    let snake = name.to_string().to_case(Case::Snake);

    let columns = parse_columns(&input)?;
    if columns.is_empty() {
        return Err(syn::Error::new_spanned(
            name,
            "Entity requires at least one field",
        ));
    }

    let table = parse_table(&input.attrs)?.unwrap_or_else(|| format!("{}s", snake));
    let primary_key = columns
        .iter()
        .find(|column| column.primary_key)
        .or_else(|| columns.iter().find(|column| column.ident == "id"))
        .map(|column| column.column.clone())
        .ok_or_else(|| {
            syn::Error::new_spanned(name, "Entity needs a `#[primary_key]` field or a field named `id`")
        })?;
    let associations = parse_associations(&input.attrs, &snake)?;

    let scalar_attributes = columns.iter().map(|column| {
        let attr_name = column.ident.to_string();
        let column_name = &column.column;
        quote! {
            ::criteria_resolver::AttributeMeta {
                name: #attr_name,
                column: #column_name,
                kind: ::criteria_resolver::AttributeKind::Scalar,
            }
        }
    });

    let association_attributes = associations.iter().map(|association| {
        let attr_name = &association.name;
        let target = &association.target;
        let foreign_key = &association.foreign_key;
        let variant = match association.kind {
            AssociationKind::BelongsTo => quote! { BelongsTo },
            AssociationKind::HasMany => quote! { HasMany },
        };
        quote! {
            ::criteria_resolver::AttributeMeta {
                name: #attr_name,
                column: #foreign_key,
                kind: ::criteria_resolver::AttributeKind::#variant {
                    target: <#target as ::criteria_resolver::Entity>::meta,
                    foreign_key: #foreign_key,
                },
            }
        }
    });

    let attribute_count = columns.len() + associations.len();
    let entity_name = name.to_string();

    let projection_specs = columns.iter().map(|column| {
        let source = column.ident.to_string();
        quote! {
            ::criteria_resolver::ProjectionSpec {
                source_field: #source,
                target_path: ::std::option::Option::None,
            }
        }
    });
    let column_count = columns.len();

    let idents: Vec<&Ident> = columns.iter().map(|column| &column.ident).collect();
    let from_row = from_row_impl(&input, &idents);

    Ok(quote! {
        impl ::criteria_resolver::Entity for #name {
            fn meta() -> &'static ::criteria_resolver::EntityMeta {
                static ATTRIBUTES: [::criteria_resolver::AttributeMeta; #attribute_count] = [
                    #(#scalar_attributes,)*
                    #(#association_attributes,)*
                ];
                static META: ::criteria_resolver::EntityMeta = ::criteria_resolver::EntityMeta {
                    name: #entity_name,
                    table: #table,
                    primary_key: #primary_key,
                    attributes: &ATTRIBUTES,
                };
                &META
            }
        }

        impl ::criteria_resolver::Projection for #name {
            fn projection_specs() -> &'static [::criteria_resolver::ProjectionSpec] {
                static SPECS: [::criteria_resolver::ProjectionSpec; #column_count] =
                    [#(#projection_specs),*];
                &SPECS
            }
        }

        #from_row
    })
}

fn parse_columns(input: &DeriveInput) -> syn::Result<Vec<Column>> {
    let mut columns = Vec::new();

    for field in named_fields(input, "Entity")? {
        let ident = field_ident(field)?.clone();
        let mut column = ident.to_string();
        let mut primary_key = false;

        for attr in &field.attrs {
            if attr.path().is_ident("primary_key") {
                attr.meta.require_path_only()?;
                primary_key = true;
            } else if attr.path().is_ident("column") {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("name") {
                        let lit: LitStr = meta.value()?.parse()?;
                        column = lit.value();
                        Ok(())
                    } else {
                        Err(meta.error("expected `name`"))
                    }
                })?;
            }
        }

        columns.push(Column {
            ident,
            column,
            primary_key,
        });
    }

    if columns.iter().filter(|column| column.primary_key).count() > 1 {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "only one field may be marked `#[primary_key]`",
        ));
    }

    Ok(columns)
}

fn parse_table(attrs: &[Attribute]) -> syn::Result<Option<String>> {
    let mut table = None;

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("entity")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                let lit: LitStr = meta.value()?.parse()?;
                table = Some(lit.value());
                Ok(())
            } else {
                Err(meta.error("expected `table`"))
            }
        })?;
    }

    Ok(table)
}

/// `#[belongs_to(name, target = Type, foreign_key = "...")]` and
/// `#[has_many(name, target = Type, foreign_key = "...")]`
fn parse_associations(attrs: &[Attribute], owner_snake: &str) -> syn::Result<Vec<Association>> {
    let mut associations = Vec::new();

    for attr in attrs {
        let kind = if attr.path().is_ident("belongs_to") {
            AssociationKind::BelongsTo
        } else if attr.path().is_ident("has_many") {
            AssociationKind::HasMany
        } else {
            continue;
        };

        let mut name: Option<Ident> = None;
        let mut target: Option<Path> = None;
        let mut foreign_key: Option<String> = None;

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("target") {
                target = Some(meta.value()?.parse()?);
                Ok(())
            } else if meta.path.is_ident("foreign_key") {
                let lit: LitStr = meta.value()?.parse()?;
                foreign_key = Some(lit.value());
                Ok(())
            } else if meta.input.is_empty() || meta.input.peek(Token![,]) {
                let ident = meta.path.require_ident()?;
                if name.replace(ident.clone()).is_some() {
                    return Err(meta.error("association name given twice"));
                }
                Ok(())
            } else {
                Err(meta.error("expected an association name, `target` or `foreign_key`"))
            }
        })?;

        let name = name.ok_or_else(|| syn::Error::new_spanned(attr, "missing association name"))?;
        let target =
            target.ok_or_else(|| syn::Error::new_spanned(attr, "missing `target = Type`"))?;
        let foreign_key = foreign_key.unwrap_or_else(|| match kind {
            AssociationKind::BelongsTo => format!("{}_id", name),
            AssociationKind::HasMany => format!("{}_id", owner_snake),
        });

        associations.push(Association {
            kind,
            name: name.to_string(),
            target,
            foreign_key,
        });
    }

    Ok(associations)
}
