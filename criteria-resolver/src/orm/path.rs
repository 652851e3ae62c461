//! Attribute path resolution and the per-build join cache
//!
//! A [`QueryContext`] lives for exactly one query build. It owns the joins
//! created so far, keyed by association path, so every reference to the same
//! association inside one build reuses the same join alias. Nothing here is
//! shared between builds, which keeps a repository free of mutable state.

use std::collections::HashMap;

use super::traits::{AttributeKind, EntityMeta, JoinKind, JoinSpec};
use crate::error::{CriteriaError, SpecViolation, ViolationKind};

/// Alias of the root entity in every query
pub const ROOT_ALIAS: &str = "t0";

/// Quote an SQL identifier
pub(crate) fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// A column reference inside one query build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    pub alias: String,
    pub column: &'static str,
}

impl ResolvedPath {
    pub fn new(alias: impl Into<String>, column: &'static str) -> Self {
        Self {
            alias: alias.into(),
            column,
        }
    }

    pub fn to_sql(&self) -> String {
        format!("{}.{}", self.alias, quote_ident(self.column))
    }
}

/// A join materialized into the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinClause {
    /// Association path from the root (e.g. "department" or "projects.tasks")
    pub path: String,
    pub alias: String,
    pub kind: JoinKind,
    pub table: &'static str,
    /// Column on the joined table
    pub joined: ResolvedPath,
    /// Column on the parent it is matched against
    pub parent: ResolvedPath,
}

impl JoinClause {
    pub fn to_sql(&self) -> String {
        format!(
            "{} {} AS {} ON {} = {}",
            self.kind.to_sql(),
            quote_ident(self.table),
            self.alias,
            self.joined.to_sql(),
            self.parent.to_sql()
        )
    }
}

/// One association crossed while walking a path.
#[derive(Debug)]
struct JoinStep {
    path: String,
    target: &'static EntityMeta,
    joined_column: &'static str,
    parent_column: &'static str,
}

/// Result of walking a path against the metamodel, before any join exists.
#[derive(Debug)]
struct PathWalk {
    joins: Vec<JoinStep>,
    column: &'static str,
}

/// Per-build state shared by projection and predicate resolution.
#[derive(Debug)]
pub struct QueryContext {
    root: &'static EntityMeta,
    default_join_kind: JoinKind,
    joins: Vec<JoinClause>,
    cache: HashMap<String, usize>,
}

impl QueryContext {
    pub fn new(root: &'static EntityMeta, default_join_kind: JoinKind) -> Self {
        Self {
            root,
            default_join_kind,
            joins: Vec::new(),
            cache: HashMap::new(),
        }
    }

    pub fn root(&self) -> &'static EntityMeta {
        self.root
    }

    /// Joins created so far, in creation order
    pub fn joins(&self) -> &[JoinClause] {
        &self.joins
    }

    pub(crate) fn into_joins(self) -> Vec<JoinClause> {
        self.joins
    }

    /// Create the joins a search object asks for up front.
    ///
    /// Every segment of a join path must be an association. Intermediate
    /// associations take their own entry's kind when the join spec lists them,
    /// otherwise the kind of the path being joined.
    pub fn apply_join_spec(&mut self, spec: &JoinSpec) -> Result<(), CriteriaError> {
        let mut violations = Vec::new();

        for (path, kind) in spec.iter() {
            match self.walk_associations(path) {
                Ok(steps) => {
                    self.commit(&steps, |step_path| spec.get(step_path).unwrap_or(kind));
                }
                Err(violation) => violations.push(SpecViolation::new(violation)),
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations.into())
        }
    }

    /// Resolve a dotted attribute path to a column, creating joins on demand.
    ///
    /// Joins are only created once the whole path is known to be valid, so
    /// a failed resolution leaves the context unchanged.
    pub fn resolve(&mut self, path: &str) -> Result<ResolvedPath, ViolationKind> {
        let walk = self.walk(path)?;
        let default_kind = self.default_join_kind;
        let alias = self.commit(&walk.joins, |_| default_kind);
        Ok(ResolvedPath::new(alias, walk.column))
    }

    /// Check a path against the metamodel without creating joins.
    pub fn check(&self, path: &str) -> Result<(), ViolationKind> {
        self.walk(path).map(|_| ())
    }

    fn walk(&self, path: &str) -> Result<PathWalk, ViolationKind> {
        let segments = split_path(path)?;
        let last = segments.len() - 1;

        let mut entity = self.root;
        let mut prefix = String::new();
        let mut joins = Vec::new();

        for (i, segment) in segments.iter().enumerate() {
            let attribute = entity
                .attribute(segment)
                .ok_or_else(|| ViolationKind::UnknownAttribute {
                    path: path.to_string(),
                    segment: segment.to_string(),
                    entity: entity.name,
                })?;

            if !prefix.is_empty() {
                prefix.push('.');
            }
            prefix.push_str(segment);

            match attribute.kind {
                AttributeKind::Scalar if i == last => {
                    return Ok(PathWalk {
                        joins,
                        column: attribute.column,
                    });
                }
                AttributeKind::Scalar => {
                    return Err(ViolationKind::ScalarTraversal {
                        path: path.to_string(),
                        segment: segment.to_string(),
                    });
                }
                // The foreign key already identifies the associated row
                AttributeKind::BelongsTo { foreign_key, .. } if i == last => {
                    return Ok(PathWalk {
                        joins,
                        column: foreign_key,
                    });
                }
                AttributeKind::BelongsTo {
                    target,
                    foreign_key,
                } => {
                    let target = target();
                    joins.push(JoinStep {
                        path: prefix.clone(),
                        target,
                        joined_column: target.primary_key,
                        parent_column: foreign_key,
                    });
                    entity = target;
                }
                AttributeKind::HasMany {
                    target,
                    foreign_key,
                } => {
                    let target = target();
                    joins.push(JoinStep {
                        path: prefix.clone(),
                        target,
                        joined_column: foreign_key,
                        parent_column: entity.primary_key,
                    });
                    entity = target;

                    if i == last {
                        return Ok(PathWalk {
                            joins,
                            column: entity.primary_key,
                        });
                    }
                }
            }
        }

        Err(ViolationKind::MalformedPath {
            path: path.to_string(),
        })
    }

    /// Walk a join path, requiring every segment to be an association.
    fn walk_associations(&self, path: &str) -> Result<Vec<JoinStep>, ViolationKind> {
        let segments = split_path(path)?;

        let mut entity = self.root;
        let mut prefix = String::new();
        let mut steps = Vec::with_capacity(segments.len());

        for segment in segments {
            let attribute = entity
                .attribute(segment)
                .ok_or_else(|| ViolationKind::UnknownAttribute {
                    path: path.to_string(),
                    segment: segment.to_string(),
                    entity: entity.name,
                })?;

            if !prefix.is_empty() {
                prefix.push('.');
            }
            prefix.push_str(segment);

            let (target, joined_column, parent_column) = match attribute.kind {
                AttributeKind::BelongsTo {
                    target,
                    foreign_key,
                } => {
                    let target = target();
                    (target, target.primary_key, foreign_key)
                }
                AttributeKind::HasMany {
                    target,
                    foreign_key,
                } => (target(), foreign_key, entity.primary_key),
                AttributeKind::Scalar => {
                    return Err(ViolationKind::NotAnAssociation {
                        path: path.to_string(),
                        segment: segment.to_string(),
                    });
                }
            };

            steps.push(JoinStep {
                path: prefix.clone(),
                target,
                joined_column,
                parent_column,
            });
            entity = target;
        }

        Ok(steps)
    }

    /// Materialize the joins of a walk, reusing cached ones. Returns the
    /// alias the final column lives on.
    fn commit(&mut self, steps: &[JoinStep], kind_for: impl Fn(&str) -> JoinKind) -> String {
        let mut alias = ROOT_ALIAS.to_string();
        for step in steps {
            alias = self.ensure_join(step, &alias, kind_for(&step.path));
        }
        alias
    }

    fn ensure_join(&mut self, step: &JoinStep, parent_alias: &str, kind: JoinKind) -> String {
        if let Some(&index) = self.cache.get(&step.path) {
            return self.joins[index].alias.clone();
        }

        let alias = format!("t{}", self.joins.len() + 1);
        tracing::trace!(path = %step.path, alias = %alias, kind = ?kind, "Creating join");

        self.cache.insert(step.path.clone(), self.joins.len());
        self.joins.push(JoinClause {
            path: step.path.clone(),
            alias: alias.clone(),
            kind,
            table: step.target.table,
            joined: ResolvedPath::new(alias.clone(), step.joined_column),
            parent: ResolvedPath::new(parent_alias, step.parent_column),
        });

        alias
    }
}

fn split_path(path: &str) -> Result<Vec<&str>, ViolationKind> {
    let segments: Vec<&str> = path.split('.').map(str::trim).collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(ViolationKind::MalformedPath {
            path: path.to_string(),
        });
    }
    Ok(segments)
}
