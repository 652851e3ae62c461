//! Criteria ORM layer
//!
//! Translates annotated search objects into SQL over an entity metamodel.
//! The `criteria-resolver-macros` crate generates the mapping descriptors
//! from annotated Rust structs:
//! - `#[derive(Entity)]`: table, columns and associations ([`EntityMeta`])
//! - `#[derive(SearchObject)]`: filter fields ([`FieldSpec`])
//! - `#[derive(Projection)]`: output columns ([`ProjectionSpec`])
//!
//! A query build walks those descriptors once: [`path`] resolves attribute
//! paths and owns the join cache, [`predicate`] and [`projection`] turn
//! fields into conditions and columns, [`builder`] renders and executes.

pub mod builder;
pub mod path;
pub mod predicate;
pub mod projection;
mod repository;
mod traits;
mod value;

#[cfg(test)]
pub(crate) mod fixtures;

pub use builder::{CriteriaQuery, TypedQuery};
pub use path::{JoinClause, QueryContext, ROOT_ALIAS, ResolvedPath};
pub use predicate::{ComparisonOp, Predicate, TextMatch, build_predicates};
pub use projection::{Selection, build_selection, selection_for};
pub use repository::*;
pub use traits::*;
pub use value::*;
