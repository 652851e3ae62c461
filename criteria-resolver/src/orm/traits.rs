//! Core traits and mapping descriptors for the criteria layer
//!
//! These traits are implemented by the `#[derive(SearchObject)]`,
//! `#[derive(Projection)]` and `#[derive(Entity)]` macros from
//! `criteria-resolver-macros`. The descriptors they produce are `'static`,
//! so every query build reads the same immutable mapping.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;

use super::value::CriteriaValue;
use crate::error::ParseKindError;

/// How a search field's value is compared against its target attribute.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonKind {
    /// `attr = value`
    #[default]
    Equals,
    /// `attr` contains `value`
    Like,
    /// `attr` begins with `value`
    StartsWith,
    /// `attr` ends with `value`
    EndsWith,
    GreaterThan,
    GreaterEquals,
    LessThan,
    LessEquals,
    /// `attr` is one of the listed values
    In,
    /// `attr` is none of the listed values
    NotIn,
    /// `attr <> value`
    Different,
}

impl ComparisonKind {
    pub const ALL: [ComparisonKind; 11] = [
        ComparisonKind::Equals,
        ComparisonKind::Like,
        ComparisonKind::StartsWith,
        ComparisonKind::EndsWith,
        ComparisonKind::GreaterThan,
        ComparisonKind::GreaterEquals,
        ComparisonKind::LessThan,
        ComparisonKind::LessEquals,
        ComparisonKind::In,
        ComparisonKind::NotIn,
        ComparisonKind::Different,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonKind::Equals => "equals",
            ComparisonKind::Like => "like",
            ComparisonKind::StartsWith => "starts_with",
            ComparisonKind::EndsWith => "ends_with",
            ComparisonKind::GreaterThan => "greater_than",
            ComparisonKind::GreaterEquals => "greater_equals",
            ComparisonKind::LessThan => "less_than",
            ComparisonKind::LessEquals => "less_equals",
            ComparisonKind::In => "in",
            ComparisonKind::NotIn => "not_in",
            ComparisonKind::Different => "different",
        }
    }

    /// Whether this kind needs an orderable value
    pub fn is_ordering(&self) -> bool {
        matches!(
            self,
            ComparisonKind::GreaterThan
                | ComparisonKind::GreaterEquals
                | ComparisonKind::LessThan
                | ComparisonKind::LessEquals
        )
    }
}

impl fmt::Display for ComparisonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComparisonKind {
    type Err = ParseKindError;

    /// Accepts the snake_case names, case-insensitively (`like`, `NOT_IN`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == lowered)
            .ok_or_else(|| ParseKindError {
                what: "comparison kind",
                value: s.to_string(),
            })
    }
}

/// Join type used when an association is materialized into the query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinKind {
    #[default]
    Inner,
    Left,
    Right,
}

impl JoinKind {
    /// Convert to the SQL join keyword
    pub fn to_sql(&self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
        }
    }
}

impl FromStr for JoinKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inner" => Ok(JoinKind::Inner),
            "left" => Ok(JoinKind::Left),
            "right" => Ok(JoinKind::Right),
            _ => Err(ParseKindError {
                what: "join kind",
                value: s.to_string(),
            }),
        }
    }
}

/// Association paths a search object wants joined up front, with their kind.
///
/// Insertion ordered so the rendered SQL is stable. Inserting a path twice
/// replaces its kind in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinSpec {
    entries: Vec<(String, JoinKind)>,
}

impl JoinSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, kind: JoinKind) -> &mut Self {
        let path = path.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == path) {
            Some(entry) => entry.1 = kind,
            None => self.entries.push((path, kind)),
        }
        self
    }

    pub fn get(&self, path: &str) -> Option<JoinKind> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == path)
            .map(|(_, kind)| *kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, JoinKind)> {
        self.entries.iter().map(|(path, kind)| (path.as_str(), *kind))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<P: Into<String>> FromIterator<(P, JoinKind)> for JoinSpec {
    fn from_iter<I: IntoIterator<Item = (P, JoinKind)>>(iter: I) -> Self {
        let mut spec = JoinSpec::new();
        for (path, kind) in iter {
            spec.insert(path, kind);
        }
        spec
    }
}

/// Mapping of one search-object field onto an entity attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field name on the search object
    pub source_field: &'static str,
    /// Dotted attribute path, when it differs from the field name
    pub target_path: Option<&'static str>,
    pub comparison: ComparisonKind,
}

impl FieldSpec {
    /// The effective attribute path
    pub fn path(&self) -> &'static str {
        self.target_path.unwrap_or(self.source_field)
    }
}

/// Mapping of one projection-type field onto an entity attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectionSpec {
    pub source_field: &'static str,
    pub target_path: Option<&'static str>,
}

impl ProjectionSpec {
    pub fn path(&self) -> &'static str {
        self.target_path.unwrap_or(self.source_field)
    }
}

/// A populated search field: its mapping plus the value to compare against.
#[derive(Debug, Clone, PartialEq)]
pub struct Criterion {
    pub spec: &'static FieldSpec,
    pub value: CriteriaValue,
}

/// A caller-populated filter specification.
///
/// Implemented by `#[derive(SearchObject)]`. Fields without a `#[criteria]`
/// attribute are ignored, and fields whose value is absent contribute no
/// criterion.
pub trait SearchObject {
    /// Mapping descriptors for every `#[criteria]` field, in declaration order.
    fn field_specs() -> &'static [FieldSpec]
    where
        Self: Sized;

    /// Criteria for the fields that currently hold a value.
    fn criteria(&self) -> Vec<Criterion>;

    /// Associations to join before predicates are resolved.
    fn joins(&self) -> JoinSpec {
        JoinSpec::new()
    }
}

/// Metadata about a database entity (table).
///
/// Implemented by `#[derive(Entity)]` macro.
#[derive(Debug)]
pub struct EntityMeta {
    /// Rust type name, used in error messages
    pub name: &'static str,
    /// The SQL table name (e.g., "employees")
    pub table: &'static str,
    /// The primary key column name (e.g., "id")
    pub primary_key: &'static str,
    /// Scalar columns first, in declaration order, then associations
    pub attributes: &'static [AttributeMeta],
}

impl EntityMeta {
    pub fn attribute(&self, name: &str) -> Option<&'static AttributeMeta> {
        self.attributes.iter().find(|attribute| attribute.name == name)
    }

    /// Scalar column names in declaration order
    pub fn scalar_columns(&self) -> impl Iterator<Item = &'static str> {
        self.attributes
            .iter()
            .filter(|attribute| matches!(attribute.kind, AttributeKind::Scalar))
            .map(|attribute| attribute.column)
    }
}

#[derive(Debug)]
pub struct AttributeMeta {
    /// Name used in attribute paths
    pub name: &'static str,
    /// Column backing the attribute; the foreign key for `BelongsTo`
    pub column: &'static str,
    pub kind: AttributeKind,
}

#[derive(Debug, Clone, Copy)]
pub enum AttributeKind {
    /// A plain column
    Scalar,
    /// To-one association; `foreign_key` lives on this entity's table
    BelongsTo {
        target: fn() -> &'static EntityMeta,
        foreign_key: &'static str,
    },
    /// Collection-valued association; `foreign_key` lives on the target's table
    HasMany {
        target: fn() -> &'static EntityMeta,
        foreign_key: &'static str,
    },
}

impl AttributeKind {
    pub fn is_association(&self) -> bool {
        !matches!(self, AttributeKind::Scalar)
    }
}

/// Trait for decoding a database row into a value.
///
/// Columns are read by position, so the selection order of the query must
/// match the declaration order of the type's fields.
pub trait FromSqlRow: Sized {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error>;
}

/// An output shape for `get_generic_query`.
///
/// Implemented by `#[derive(Projection)]` and, for whole-entity output,
/// by `#[derive(Entity)]`.
pub trait Projection: FromSqlRow + Send + 'static {
    /// One descriptor per field, in declaration order.
    fn projection_specs() -> &'static [ProjectionSpec];
}

/// A queryable root entity.
pub trait Entity: Projection {
    fn meta() -> &'static EntityMeta;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparison_kind_parse() {
        assert_eq!("like".parse::<ComparisonKind>(), Ok(ComparisonKind::Like));
        assert_eq!("NOT_IN".parse::<ComparisonKind>(), Ok(ComparisonKind::NotIn));
        assert_eq!(
            "Greater_Equals".parse::<ComparisonKind>(),
            Ok(ComparisonKind::GreaterEquals)
        );
        assert!("between".parse::<ComparisonKind>().is_err());

        for kind in ComparisonKind::ALL {
            assert_eq!(kind.as_str().parse::<ComparisonKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_join_spec_replaces_in_place() {
        let mut spec = JoinSpec::new();
        spec.insert("tasks", JoinKind::Inner)
            .insert("department", JoinKind::Left)
            .insert("tasks", JoinKind::Left);

        let entries: Vec<_> = spec.iter().collect();
        assert_eq!(
            entries,
            vec![("tasks", JoinKind::Left), ("department", JoinKind::Left)]
        );
        assert_eq!(spec.get("department"), Some(JoinKind::Left));
        assert_eq!(spec.get("projects"), None);
    }

    #[test]
    fn test_field_spec_path_override() {
        let plain = FieldSpec {
            source_field: "name",
            target_path: None,
            comparison: ComparisonKind::Like,
        };
        let nested = FieldSpec {
            source_field: "department",
            target_path: Some("department.name"),
            comparison: ComparisonKind::Equals,
        };
        assert_eq!(plain.path(), "name");
        assert_eq!(nested.path(), "department.name");
    }
}
