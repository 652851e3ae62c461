//! SQL rendering and execution for criteria queries
//!
//! A [`CriteriaQuery`] is the assembled plan of one build: root table, joins,
//! selection and predicates. It renders to parameterized SQL with numbered
//! placeholders (`?1`, `?2`, ...) so values never end up in the SQL text.

use std::marker::PhantomData;

use sqlx::{Row, SqlitePool};

use super::path::{JoinClause, ROOT_ALIAS, ResolvedPath, quote_ident};
use super::predicate::{Predicate, TextMatch};
use super::projection::Selection;
use super::traits::{EntityMeta, FromSqlRow};
use super::value::SqlValue;
use crate::error::{CriteriaError, Result};

/// A fully resolved query, ready to render.
#[derive(Debug, Clone)]
pub struct CriteriaQuery {
    root: &'static EntityMeta,
    joins: Vec<JoinClause>,
    predicates: Vec<Predicate>,
    selection: Selection,
}

impl CriteriaQuery {
    pub fn new(
        root: &'static EntityMeta,
        joins: Vec<JoinClause>,
        selection: Selection,
        predicates: Vec<Predicate>,
    ) -> Self {
        Self {
            root,
            joins,
            predicates,
            selection,
        }
    }

    pub fn root(&self) -> &'static EntityMeta {
        self.root
    }

    pub fn joins(&self) -> &[JoinClause] {
        &self.joins
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Build the SQL string and the values to bind, in placeholder order.
    ///
    /// `limit` and `offset` are ignored for count selections.
    pub fn to_sql(&self, limit: Option<u32>, offset: Option<u32>) -> (String, Vec<SqlValue>) {
        let mut values = Vec::new();
        let mut sql = format!(
            "SELECT {} FROM {} AS {}",
            self.select_list(),
            quote_ident(self.root.table),
            ROOT_ALIAS
        );

        for join in &self.joins {
            sql.push(' ');
            sql.push_str(&join.to_sql());
        }

        if !self.predicates.is_empty() {
            let conditions: Vec<String> = self
                .predicates
                .iter()
                .map(|predicate| render_predicate(predicate, &mut values))
                .collect();
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }

        if self.selection != Selection::Count {
            match (limit, offset) {
                (Some(limit), Some(offset)) if offset > 0 => {
                    sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset));
                }
                (Some(limit), _) => sql.push_str(&format!(" LIMIT {}", limit)),
                // SQLite only accepts OFFSET after a LIMIT
                (None, Some(offset)) if offset > 0 => {
                    sql.push_str(&format!(" LIMIT -1 OFFSET {}", offset));
                }
                (None, _) => {}
            }
        }

        (sql, values)
    }

    fn select_list(&self) -> String {
        match &self.selection {
            Selection::Entity => self
                .root
                .scalar_columns()
                .map(|column| ResolvedPath::new(ROOT_ALIAS, column).to_sql())
                .collect::<Vec<_>>()
                .join(", "),
            Selection::Columns(columns) => columns
                .iter()
                .map(ResolvedPath::to_sql)
                .collect::<Vec<_>>()
                .join(", "),
            Selection::Count => "COUNT(*)".to_string(),
        }
    }
}

fn placeholder(value: SqlValue, values: &mut Vec<SqlValue>) -> String {
    values.push(value);
    format!("?{}", values.len())
}

fn render_predicate(predicate: &Predicate, values: &mut Vec<SqlValue>) -> String {
    match predicate {
        Predicate::Compare { target, op, value } => format!(
            "{} {} {}",
            target.to_sql(),
            op.to_sql(),
            placeholder(value.clone(), values)
        ),
        // Binary comparisons: case-sensitive and free of wildcards
        Predicate::Text { target, op, needle } => {
            let column = target.to_sql();
            let param = placeholder(SqlValue::String(needle.clone()), values);
            match op {
                TextMatch::Contains => format!("instr({}, {}) > 0", column, param),
                TextMatch::StartsWith => format!(
                    "substr({}, 1, length({})) = {}",
                    column, param, param
                ),
                TextMatch::EndsWith => format!(
                    "substr({}, length({}) - length({}) + 1) = {}",
                    column, column, param, param
                ),
            }
        }
        // Nothing is a member of the empty set
        Predicate::Membership {
            values: members,
            negated,
            ..
        } if members.is_empty() => {
            if *negated {
                "1 = 1".to_string()
            } else {
                "1 = 0".to_string()
            }
        }
        Predicate::Membership {
            target,
            values: members,
            negated,
        } => {
            let params: Vec<String> = members
                .iter()
                .map(|member| placeholder(member.clone(), values))
                .collect();
            format!(
                "{} {}IN ({})",
                target.to_sql(),
                if *negated { "NOT " } else { "" },
                params.join(", ")
            )
        }
    }
}

/// A built query bound to a pool, decoding rows into `D`.
///
/// Returned by the repository's `get_query` and `get_generic_query`; the
/// caller may restrict the row window before executing it.
pub struct TypedQuery<'a, D> {
    pool: &'a SqlitePool,
    query: CriteriaQuery,
    max_results: Option<u32>,
    first_result: Option<u32>,
    _output: PhantomData<fn() -> D>,
}

impl<'a, D: FromSqlRow> TypedQuery<'a, D> {
    pub(crate) fn new(pool: &'a SqlitePool, query: CriteriaQuery) -> Self {
        Self {
            pool,
            query,
            max_results: None,
            first_result: None,
            _output: PhantomData,
        }
    }

    /// Limit the number of rows returned.
    pub fn max_results(mut self, max_results: u32) -> Self {
        self.max_results = Some(max_results);
        self
    }

    /// Skip the first `first_result` rows.
    pub fn first_result(mut self, first_result: u32) -> Self {
        self.first_result = Some(first_result);
        self
    }

    pub fn query(&self) -> &CriteriaQuery {
        &self.query
    }

    /// The SQL that `fetch_all` executes
    pub fn sql(&self) -> String {
        self.query.to_sql(self.max_results, self.first_result).0
    }

    /// Bind values for [`TypedQuery::sql`], in placeholder order
    pub fn params(&self) -> Vec<SqlValue> {
        self.query.to_sql(self.max_results, self.first_result).1
    }

    /// Execute the query and return all matching rows.
    pub async fn fetch_all(&self) -> Result<Vec<D>> {
        self.fetch(self.max_results).await
    }

    /// Execute the query and return the first row, if any.
    pub async fn fetch_optional(&self) -> Result<Option<D>> {
        let limit = self.max_results.map_or(1, |max| max.min(1));
        Ok(self.fetch(Some(limit)).await?.into_iter().next())
    }

    /// Execute the query expecting exactly one row.
    ///
    /// `max_results` is ignored; two rows are always fetched so a second
    /// match is reported instead of hidden.
    pub async fn get_single_result(&self) -> Result<D> {
        let mut rows = self.fetch(Some(2)).await?;

        let entity = self.query.root.name;
        match rows.len() {
            0 => Err(CriteriaError::NotFound { entity }),
            1 => Ok(rows.remove(0)),
            _ => Err(CriteriaError::AmbiguousResult { entity }),
        }
    }

    async fn fetch(&self, limit: Option<u32>) -> Result<Vec<D>> {
        let (sql, values) = self.query.to_sql(limit, self.first_result);
        tracing::debug!(sql = %sql, params = values.len(), "Executing criteria query");

        let mut query = sqlx::query(&sql);
        for value in &values {
            query = value.bind_to_query(query);
        }

        let rows = query.fetch_all(self.pool).await?;
        let decoded = rows.iter().map(D::from_row).collect::<Result<Vec<_>, _>>()?;
        Ok(decoded)
    }
}

/// Execute a count plan and return the number of matching rows.
pub(crate) async fn fetch_count(pool: &SqlitePool, query: &CriteriaQuery) -> Result<i64> {
    let (sql, values) = query.to_sql(None, None);
    tracing::debug!(sql = %sql, params = values.len(), "Executing criteria count query");

    let mut count_query = sqlx::query(&sql);
    for value in &values {
        count_query = value.bind_to_query(count_query);
    }

    let row = count_query.fetch_one(pool).await?;
    Ok(row.try_get::<i64, _>(0)?)
}
