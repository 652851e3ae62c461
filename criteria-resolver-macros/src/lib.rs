//! Procedural macros for the criteria resolver
//!
//! This crate generates the static mapping descriptors the resolver reads:
//!
//! - `#[derive(Entity)]` - table, columns and associations of a root entity
//! - `#[derive(SearchObject)]` - filter fields and their comparisons
//! - `#[derive(Projection)]` - output columns of a projected query
//!
//! Comparison names, join kinds and attribute paths are checked when the
//! derive expands; whether a path exists on a given entity is checked by
//! `CriteriaRepository::validate` at startup.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod attrs;
mod entity;
mod projection;
mod search_object;

/// Describe a table and its associations.
///
/// # Usage
///
/// ```ignore
/// #[derive(Entity)]
/// #[entity(table = "employees")]
/// #[belongs_to(department, target = Department, foreign_key = "department_id")]
/// #[has_many(tasks, target = Task)]
/// pub struct Employee {
///     #[primary_key]
///     pub id: i64,
///     pub name: String,
///     #[column(name = "hire_date")]
///     pub hired_on: String,
///     pub department_id: Option<i64>,
/// }
/// ```
///
/// Every field is a scalar column, decoded positionally in declaration
/// order. Associations are declared on the struct and become path segments
/// (`department.name`, `tasks.status`).
#[proc_macro_derive(Entity, attributes(entity, primary_key, column, belongs_to, has_many))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    entity::expand(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Map the fields of a search object onto entity attribute paths.
///
/// # Usage
///
/// ```ignore
/// #[derive(SearchObject, Default)]
/// #[search_object(join(path = "tasks", kind = "left"))]
/// pub struct EmployeeSearch {
///     // Attribute `name`, case-sensitive substring match
///     #[criteria(comparison = "like")]
///     pub name: Option<String>,
///
///     // Attribute `name` of the joined department, equality
///     #[criteria(path = "department.name")]
///     pub department: Option<String>,
///
///     #[criteria(path = "tasks.status", comparison = "in")]
///     pub task_statuses: Option<Vec<String>>,
///
///     // No `#[criteria]`: never a filter
///     pub page: Option<u32>,
/// }
/// ```
///
/// Comparisons: `equals` (default), `like`, `starts_with`, `ends_with`,
/// `greater_than`, `greater_equals`, `less_than`, `less_equals`, `in`,
/// `not_in`, `different`.
#[proc_macro_derive(SearchObject, attributes(criteria, search_object))]
pub fn derive_search_object(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    search_object::expand(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Select one column per field, in declaration order.
///
/// ```ignore
/// #[derive(Projection)]
/// pub struct EmployeeSummary {
///     #[projection(path = "department.name")]
///     pub department_name: String,
///     pub name: String,
/// }
/// ```
#[proc_macro_derive(Projection, attributes(projection))]
pub fn derive_projection(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    projection::expand(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
