//! Predicate building from populated search objects
//!
//! Each populated criterion becomes one [`Predicate`]; predicates are ANDed
//! together when the query is rendered.

use super::path::{QueryContext, ResolvedPath};
use super::traits::{ComparisonKind, Criterion, SearchObject};
use super::value::{CriteriaValue, SqlValue};
use crate::config::FieldErrorPolicy;
use crate::error::{CriteriaError, SpecViolation, ViolationKind};

/// Binary comparison operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl ComparisonOp {
    pub fn to_sql(&self) -> &'static str {
        match self {
            ComparisonOp::Eq => "=",
            ComparisonOp::Ne => "<>",
            ComparisonOp::Gt => ">",
            ComparisonOp::Gte => ">=",
            ComparisonOp::Lt => "<",
            ComparisonOp::Lte => "<=",
        }
    }
}

/// Substring position tested by a [`Predicate::Text`] match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMatch {
    Contains,
    StartsWith,
    EndsWith,
}

/// A single boolean condition of the WHERE clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare {
        target: ResolvedPath,
        op: ComparisonOp,
        value: SqlValue,
    },
    /// Case-sensitive, literal substring match
    Text {
        target: ResolvedPath,
        op: TextMatch,
        needle: String,
    },
    Membership {
        target: ResolvedPath,
        values: Vec<SqlValue>,
        negated: bool,
    },
}

impl Predicate {
    pub fn target(&self) -> &ResolvedPath {
        match self {
            Predicate::Compare { target, .. }
            | Predicate::Text { target, .. }
            | Predicate::Membership { target, .. } => target,
        }
    }
}

/// A checked comparison waiting for its resolved column.
#[derive(Debug)]
enum Operation {
    Compare(ComparisonOp, SqlValue),
    Text(TextMatch, String),
    Membership(Vec<SqlValue>, bool),
}

impl Operation {
    fn into_predicate(self, target: ResolvedPath) -> Predicate {
        match self {
            Operation::Compare(op, value) => Predicate::Compare { target, op, value },
            Operation::Text(op, needle) => Predicate::Text { target, op, needle },
            Operation::Membership(values, negated) => Predicate::Membership {
                target,
                values,
                negated,
            },
        }
    }
}

/// Build the predicates for every populated field of a search object.
///
/// With [`FieldErrorPolicy::FailFast`] all offending fields are reported in
/// one `InvalidQuerySpec` error. With [`FieldErrorPolicy::SkipAndLog`] they
/// are logged and left out of the query.
pub fn build_predicates<S: SearchObject + ?Sized>(
    ctx: &mut QueryContext,
    search: &S,
    policy: FieldErrorPolicy,
) -> Result<Vec<Predicate>, CriteriaError> {
    let mut predicates = Vec::new();
    let mut violations = Vec::new();

    for criterion in search.criteria() {
        let field = criterion.spec.source_field;

        match build_predicate(ctx, criterion) {
            Ok(predicate) => predicates.push(predicate),
            Err(kind) => {
                let violation = SpecViolation::field(field, kind);
                match policy {
                    FieldErrorPolicy::FailFast => violations.push(violation),
                    FieldErrorPolicy::SkipAndLog => {
                        tracing::warn!(field, error = %violation, "Skipping search field");
                    }
                }
            }
        }
    }

    if violations.is_empty() {
        Ok(predicates)
    } else {
        Err(violations.into())
    }
}

fn build_predicate(
    ctx: &mut QueryContext,
    criterion: Criterion,
) -> Result<Predicate, ViolationKind> {
    let operation = operation(criterion.spec.comparison, criterion.value)?;
    let target = ctx.resolve(criterion.spec.path())?;
    Ok(operation.into_predicate(target))
}

fn operation(kind: ComparisonKind, value: CriteriaValue) -> Result<Operation, ViolationKind> {
    use CriteriaValue::{List, Single};

    match (kind, value) {
        (ComparisonKind::In, List(values)) => Ok(Operation::Membership(values, false)),
        (ComparisonKind::In, Single(value)) => Ok(Operation::Membership(vec![value], false)),
        (ComparisonKind::NotIn, List(values)) => Ok(Operation::Membership(values, true)),
        (ComparisonKind::NotIn, Single(value)) => Ok(Operation::Membership(vec![value], true)),
        (kind, List(_)) => Err(ViolationKind::UnexpectedList { kind }),
        (ComparisonKind::Equals, Single(value)) => Ok(Operation::Compare(ComparisonOp::Eq, value)),
        (ComparisonKind::Different, Single(value)) => {
            Ok(Operation::Compare(ComparisonOp::Ne, value))
        }
        (ComparisonKind::Like, Single(value)) => {
            Ok(Operation::Text(TextMatch::Contains, value.to_pattern_text()))
        }
        (ComparisonKind::StartsWith, Single(value)) => {
            Ok(Operation::Text(TextMatch::StartsWith, value.to_pattern_text()))
        }
        (ComparisonKind::EndsWith, Single(value)) => {
            Ok(Operation::Text(TextMatch::EndsWith, value.to_pattern_text()))
        }
        (ComparisonKind::GreaterThan, Single(value)) => ordered(kind, ComparisonOp::Gt, value),
        (ComparisonKind::GreaterEquals, Single(value)) => ordered(kind, ComparisonOp::Gte, value),
        (ComparisonKind::LessThan, Single(value)) => ordered(kind, ComparisonOp::Lt, value),
        (ComparisonKind::LessEquals, Single(value)) => ordered(kind, ComparisonOp::Lte, value),
    }
}

fn ordered(
    kind: ComparisonKind,
    op: ComparisonOp,
    value: SqlValue,
) -> Result<Operation, ViolationKind> {
    if value.is_orderable() {
        Ok(Operation::Compare(op, value))
    } else {
        Err(ViolationKind::NotOrderable {
            kind,
            value_type: value.type_name(),
        })
    }
}
