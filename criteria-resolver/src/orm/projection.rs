//! Column selection for projected output types

use std::any::TypeId;

use super::path::{QueryContext, ResolvedPath};
use super::traits::{Entity, Projection, ProjectionSpec};
use crate::error::{CriteriaError, SpecViolation};

/// What the query selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// Every scalar column of the root entity, in declaration order
    Entity,
    /// Exactly these columns, in this order
    Columns(Vec<ResolvedPath>),
    /// `COUNT(*)`
    Count,
}

/// Choose the selection for output type `D` on a query rooted at `E`.
///
/// The root entity itself is selected whole; any other type gets one column
/// per field, aligned with its declaration order.
pub fn selection_for<E: Entity, D: Projection>(
    ctx: &mut QueryContext,
) -> Result<Selection, CriteriaError> {
    if TypeId::of::<D>() == TypeId::of::<E>() {
        return Ok(Selection::Entity);
    }
    build_selection(ctx, D::projection_specs())
}

/// Resolve projection specs into an ordered column selection.
///
/// An empty spec list falls back to the whole entity.
pub fn build_selection(
    ctx: &mut QueryContext,
    specs: &'static [ProjectionSpec],
) -> Result<Selection, CriteriaError> {
    if specs.is_empty() {
        return Ok(Selection::Entity);
    }

    let mut columns = Vec::with_capacity(specs.len());
    let mut violations = Vec::new();

    for spec in specs {
        match ctx.resolve(spec.path()) {
            Ok(column) => columns.push(column),
            Err(kind) => violations.push(SpecViolation::field(spec.source_field, kind)),
        }
    }

    if violations.is_empty() {
        Ok(Selection::Columns(columns))
    } else {
        Err(violations.into())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::ViolationKind;
    use crate::orm::fixtures::{Department, Employee, EmployeeSummary};
    use crate::orm::traits::JoinKind;

    fn context() -> QueryContext {
        QueryContext::new(Employee::meta(), JoinKind::Inner)
    }

    #[test]
    fn test_root_entity_selects_whole_entity() {
        let mut ctx = context();
        let selection = selection_for::<Employee, Employee>(&mut ctx).unwrap();
        assert_eq!(selection, Selection::Entity);
        assert!(ctx.joins().is_empty());
    }

    #[test]
    fn test_projection_follows_field_order() {
        let mut ctx = context();
        let selection = selection_for::<Employee, EmployeeSummary>(&mut ctx).unwrap();
        assert_eq!(
            selection,
            Selection::Columns(vec![
                ResolvedPath::new("t1", "name"),
                ResolvedPath::new("t0", "name"),
            ])
        );
        assert_eq!(ctx.joins().len(), 1);
    }

    #[test]
    fn test_other_entity_projects_its_fields() {
        // Department's fields (id, name, budget) resolved against Employee
        let mut ctx = context();
        let err = selection_for::<Employee, Department>(&mut ctx).unwrap_err();
        assert_eq!(err.violations().len(), 1);
        assert_eq!(err.violations()[0].field, Some("budget"));
        assert_matches!(
            err.violations()[0].kind,
            ViolationKind::UnknownAttribute { .. }
        );
    }

    #[test]
    fn test_empty_specs_select_entity() {
        let mut ctx = context();
        assert_eq!(build_selection(&mut ctx, &[]).unwrap(), Selection::Entity);
    }
}
