//! Criteria resolver
//!
//! Builds SQL queries from annotated search objects. Each populated field of
//! a search object becomes one predicate over an entity attribute path;
//! associations crossed by those paths are joined once per query, and
//! projection types select exactly the columns they declare.
//!
//! ```rust,ignore
//! use criteria_resolver::{CriteriaRepository, Entity, SearchObject};
//!
//! #[derive(Entity)]
//! #[belongs_to(department, target = Department)]
//! struct Employee {
//!     id: i64,
//!     name: String,
//!     department_id: i64,
//! }
//!
//! #[derive(SearchObject, Default)]
//! struct EmployeeSearch {
//!     #[criteria(comparison = "like")]
//!     name: Option<String>,
//!     #[criteria(path = "department.name")]
//!     department: Option<String>,
//! }
//!
//! let repo = CriteriaRepository::<Employee>::new(pool);
//! let rows = repo.get_result_list(&search).await?;
//! ```

// Generated code refers to this crate by name, including from its own tests
extern crate self as criteria_resolver;

pub mod config;
pub mod error;
pub mod orm;

pub use config::{FieldErrorPolicy, ResolverConfig};
pub use error::{CriteriaError, Result, SpecViolation, SpecViolations, ViolationKind};
pub use orm::{
    AttributeKind, AttributeMeta, ComparisonKind, CriteriaQuery, CriteriaRepository,
    CriteriaValue, Criterion, EntityMeta, FieldSpec, FieldValue, FromSqlRow, JoinKind, JoinSpec,
    ProjectionSpec, SqlValue, TypedQuery,
};

// Traits and derives share names; macros live in a separate namespace
pub use criteria_resolver_macros::{Entity, Projection, SearchObject};
pub use orm::{Entity, Projection, SearchObject};

#[doc(hidden)]
pub use sqlx;
