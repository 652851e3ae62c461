//! Error types for query building and execution

use std::fmt;

use thiserror::Error;

use crate::orm::ComparisonKind;

pub type Result<T, E = CriteriaError> = std::result::Result<T, E>;

/// Errors raised while building or executing a criteria query.
#[derive(Debug, Error)]
pub enum CriteriaError {
    /// The search object, join spec or projection does not fit the entity
    /// metamodel. This is a mapping mistake, not bad user input.
    #[error("invalid query spec: {0}")]
    InvalidQuerySpec(SpecViolations),

    /// A single-result query matched no rows
    #[error("single-result query on `{entity}` returned no rows")]
    NotFound { entity: &'static str },

    /// A single-result query matched more than one row
    #[error("single-result query on `{entity}` returned more than one row")]
    AmbiguousResult { entity: &'static str },

    /// Passed through unmodified from sqlx
    #[error(transparent)]
    Backend(#[from] sqlx::Error),
}

impl CriteriaError {
    /// Violations carried by an `InvalidQuerySpec` error, empty otherwise.
    pub fn violations(&self) -> &[SpecViolation] {
        match self {
            CriteriaError::InvalidQuerySpec(violations) => violations.as_slice(),
            _ => &[],
        }
    }
}

impl From<Vec<SpecViolation>> for CriteriaError {
    fn from(violations: Vec<SpecViolation>) -> Self {
        CriteriaError::InvalidQuerySpec(SpecViolations(violations))
    }
}

/// Every mapping problem found during one build, reported together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecViolations(Vec<SpecViolation>);

impl SpecViolations {
    pub fn as_slice(&self) -> &[SpecViolation] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SpecViolation> {
        self.0.iter()
    }
}

impl fmt::Display for SpecViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", violation)?;
        }
        Ok(())
    }
}

/// A single mapping problem, optionally tied to the search or projection
/// field it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecViolation {
    pub field: Option<&'static str>,
    pub kind: ViolationKind,
}

impl SpecViolation {
    pub fn new(kind: ViolationKind) -> Self {
        Self { field: None, kind }
    }

    pub fn field(field: &'static str, kind: ViolationKind) -> Self {
        Self {
            field: Some(field),
            kind,
        }
    }
}

impl fmt::Display for SpecViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.field {
            Some(field) => write!(f, "field `{}`: {}", field, self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for SpecViolation {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViolationKind {
    #[error("malformed attribute path `{path}`")]
    MalformedPath { path: String },

    #[error("unknown attribute `{segment}` on `{entity}` in path `{path}`")]
    UnknownAttribute {
        path: String,
        segment: String,
        entity: &'static str,
    },

    #[error("cannot traverse scalar attribute `{segment}` in path `{path}`")]
    ScalarTraversal { path: String, segment: String },

    #[error("`{segment}` in join path `{path}` is not an association")]
    NotAnAssociation { path: String, segment: String },

    #[error("{kind} requires an orderable value, got {value_type}")]
    NotOrderable {
        kind: ComparisonKind,
        value_type: &'static str,
    },

    #[error("{kind} takes a single value, got a list")]
    UnexpectedList { kind: ComparisonKind },
}

/// Returned when a comparison kind, join kind or policy name does not parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {what} `{value}`")]
pub struct ParseKindError {
    pub what: &'static str,
    pub value: String,
}
