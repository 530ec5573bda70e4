//! Query construction and execution over a session.
//!
//! # Responsibility
//! - Execute catalog, ad-hoc and criteria queries through one executor.
//! - Enforce singleton-result semantics (`NotFound` / `AmbiguousResult`).
//!
//! # Invariants
//! - Every parameter declared by the query text is bound before execution.
//! - Parameters are always bound by name, never interpolated into SQL text.
//! - Rows returned by a query become managed by the owning session.

pub mod catalog;
pub mod criteria;
pub mod strategy;

use crate::error::{DaoError, DaoResult};
use crate::model::entity::{select_clause, Entity};
use crate::session::Session;
use rusqlite::types::Value;
use std::collections::BTreeMap;
use std::marker::PhantomData;

/// Query bound to one session and one entity type.
///
/// Built by [`Session::create_named_query`], [`Session::create_query`] or
/// [`Session::create_criteria_query`].
pub struct TypedQuery<'s, E: Entity> {
    session: &'s Session,
    label: String,
    sql: String,
    bindings: BTreeMap<String, Value>,
    _entity: PhantomData<fn() -> E>,
}

impl<'s, E: Entity> TypedQuery<'s, E> {
    pub(crate) fn new(session: &'s Session, label: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            session,
            label: label.into(),
            sql: sql.into(),
            bindings: BTreeMap::new(),
            _entity: PhantomData,
        }
    }

    /// Catalog name, or `ad_hoc` / `criteria` for unnamed queries.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Binds `value` to the `:name` parameter, replacing an earlier binding.
    pub fn set_parameter(mut self, name: &str, value: impl Into<Value>) -> Self {
        let name = name.trim_start_matches(':');
        self.bindings.insert(name.to_string(), value.into());
        self
    }

    /// Returns every matching row in storage order.
    pub fn get_result_list(self) -> DaoResult<Vec<E>> {
        self.fetch(None)
    }

    /// Returns the only matching row.
    ///
    /// # Errors
    /// - `NotFound` when nothing matches.
    /// - `AmbiguousResult` when more than one row matches.
    pub fn get_single_result(self) -> DaoResult<E> {
        let mut rows = self.fetch(Some(2))?;
        match rows.len() {
            0 => Err(DaoError::NotFound {
                entity: E::NAME,
                key: self.describe(),
            }),
            1 => Ok(rows.remove(0)),
            _ => Err(DaoError::AmbiguousResult {
                entity: E::NAME,
                query: self.describe(),
            }),
        }
    }

    fn fetch(&self, limit: Option<usize>) -> DaoResult<Vec<E>> {
        let mut stmt = self.session.connection().prepare_cached(&self.sql)?;

        let declared = stmt.parameter_count();
        if declared != self.bindings.len() {
            return Err(DaoError::InvalidQuery(format!(
                "query `{}` declares {declared} parameter(s) but {} were bound",
                self.label,
                self.bindings.len()
            )));
        }

        for (name, value) in &self.bindings {
            let index = stmt
                .parameter_index(&format!(":{name}"))?
                .ok_or_else(|| {
                    DaoError::InvalidQuery(format!(
                        "query `{}` has no parameter named `{name}`",
                        self.label
                    ))
                })?;
            stmt.raw_bind_parameter(index, value)?;
        }

        let mut rows = stmt.raw_query();
        let mut entities = Vec::new();
        while let Some(row) = rows.next()? {
            let entity = E::from_row(row).map_err(|err| {
                DaoError::InvalidData(format!("cannot decode {} row: {err}", E::NAME))
            })?;
            entities.push(entity);
            if limit.is_some_and(|max| entities.len() >= max) {
                break;
            }
        }

        self.session.manage_all(&entities);
        Ok(entities)
    }

    fn describe(&self) -> String {
        let names = self.bindings.keys().cloned().collect::<Vec<_>>();
        format!("{}[{}]", self.label, names.join(", "))
    }
}

/// Lists rows whose `attribute` starts with `prefix`.
///
/// `prefix` is bound as-is with a trailing `%`; `%` and `_` inside it keep
/// their `LIKE` meaning. Matching is case-sensitive.
pub fn find_by_prefix<E: Entity>(
    session: &Session,
    attribute: &str,
    prefix: &str,
) -> DaoResult<Vec<E>> {
    if !E::COLUMNS.contains(&attribute) {
        return Err(DaoError::InvalidQuery(format!(
            "{} has no text attribute `{attribute}`",
            E::NAME
        )));
    }

    let sql = format!("{} WHERE {attribute} LIKE :pattern", select_clause::<E>());
    session
        .create_query::<E>(sql)
        .set_parameter("pattern", format!("{prefix}%"))
        .get_result_list()
}
