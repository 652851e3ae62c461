//! Repository facade over the criteria resolver
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use criteria_resolver::CriteriaRepository;
//!
//! let employees = CriteriaRepository::<Employee>::new(pool.clone());
//!
//! // Everyone in engineering with "ann" in their name
//! let found = employees
//!     .get_result_list(&EmployeeSearch {
//!         name: Some("ann".into()),
//!         department: Some("Engineering".into()),
//!         ..Default::default()
//!     })
//!     .await?;
//!
//! // Same filter, projected and paged
//! let summaries = employees
//!     .get_generic_query::<EmployeeSummary, _>(&search)?
//!     .max_results(20)
//!     .fetch_all()
//!     .await?;
//! ```

use std::marker::PhantomData;

use sqlx::SqlitePool;

use super::builder::{CriteriaQuery, TypedQuery, fetch_count};
use super::path::QueryContext;
use super::predicate::build_predicates;
use super::projection::{Selection, build_selection, selection_for};
use super::traits::{Entity, Projection, SearchObject};
use crate::config::ResolverConfig;
use crate::error::{CriteriaError, Result, SpecViolation};

/// Query entry point for one root entity.
///
/// Holds no per-query state: every call builds its own [`QueryContext`],
/// so a shared reference can serve concurrent tasks.
pub struct CriteriaRepository<E: Entity> {
    pool: SqlitePool,
    config: ResolverConfig,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Clone for CriteriaRepository<E> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            config: self.config,
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> CriteriaRepository<E> {
    /// Create a repository with the default configuration
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_config(pool, ResolverConfig::default())
    }

    pub fn with_config(pool: SqlitePool, config: ResolverConfig) -> Self {
        Self {
            pool,
            config,
            _entity: PhantomData,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Check every `#[criteria]` path of `S` against this entity.
    ///
    /// Meant to run once at startup; needs no populated search object.
    pub fn validate<S: SearchObject>() -> Result<()> {
        let ctx = QueryContext::new(E::meta(), Default::default());
        let violations: Vec<SpecViolation> = S::field_specs()
            .iter()
            .filter_map(|spec| {
                ctx.check(spec.path())
                    .err()
                    .map(|kind| SpecViolation::field(spec.source_field, kind))
            })
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations.into())
        }
    }

    /// Check that every field of projection `D` resolves against this entity.
    pub fn validate_projection<D: Projection>() -> Result<()> {
        let mut ctx = QueryContext::new(E::meta(), Default::default());
        selection_for::<E, D>(&mut ctx).map(|_| ())
    }

    /// Build the plan selecting whole entities.
    pub fn build_query<S: SearchObject + ?Sized>(&self, search: &S) -> Result<CriteriaQuery> {
        self.assemble(search, |_| Ok(Selection::Entity))
    }

    /// Build the plan selecting the columns of `D`.
    pub fn build_generic_query<D: Projection, S: SearchObject + ?Sized>(
        &self,
        search: &S,
    ) -> Result<CriteriaQuery> {
        self.assemble(search, selection_for::<E, D>)
    }

    /// Build the `COUNT(*)` plan.
    pub fn build_count_query<S: SearchObject + ?Sized>(&self, search: &S) -> Result<CriteriaQuery> {
        self.assemble(search, |_| Ok(Selection::Count))
    }

    pub fn get_query<S: SearchObject + ?Sized>(&self, search: &S) -> Result<TypedQuery<'_, E>> {
        Ok(TypedQuery::new(&self.pool, self.build_query(search)?))
    }

    /// Typed query decoding rows into `D`, for the caller to execute.
    pub fn get_generic_query<D: Projection, S: SearchObject + ?Sized>(
        &self,
        search: &S,
    ) -> Result<TypedQuery<'_, D>> {
        Ok(TypedQuery::new(
            &self.pool,
            self.build_generic_query::<D, S>(search)?,
        ))
    }

    /// All entities matching the search object.
    pub async fn get_result_list<S: SearchObject + ?Sized>(&self, search: &S) -> Result<Vec<E>> {
        self.get_query(search)?.fetch_all().await
    }

    /// The one entity matching the search object.
    ///
    /// Fails with `NotFound` on zero rows and `AmbiguousResult` on more than one.
    pub async fn get_single_result<S: SearchObject + ?Sized>(&self, search: &S) -> Result<E> {
        self.get_query(search)?.get_single_result().await
    }

    /// Number of rows `get_result_list` would return for the same search.
    pub async fn get_count<S: SearchObject + ?Sized>(&self, search: &S) -> Result<i64> {
        let query = self.build_count_query(search)?;
        fetch_count(&self.pool, &query).await
    }

    /// Joins first, then the selection, then predicates, sharing one context.
    fn assemble<S: SearchObject + ?Sized>(
        &self,
        search: &S,
        select: impl FnOnce(&mut QueryContext) -> Result<Selection, CriteriaError>,
    ) -> Result<CriteriaQuery> {
        let mut ctx = QueryContext::new(E::meta(), self.config.default_join_kind);

        ctx.apply_join_spec(&search.joins())?;
        let selection = select(&mut ctx)?;
        let predicates = build_predicates(&mut ctx, search, self.config.field_error_policy)?;

        Ok(CriteriaQuery::new(
            ctx.root(),
            ctx.into_joins(),
            selection,
            predicates,
        ))
    }
}
