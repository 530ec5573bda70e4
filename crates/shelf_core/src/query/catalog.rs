//! Registry of named, precompiled queries.
//!
//! # Responsibility
//! - Hold query templates keyed by logical name, each bound to one entity.
//! - Validate every template against the live schema before sessions use it.
//!
//! # Invariants
//! - Names are unique within a catalog.
//! - Templates select the full entity projection (`id` plus mapped columns).

use crate::error::{DaoError, DaoResult};
use crate::model::author::Author;
use crate::model::book::Book;
use crate::model::entity::{select_clause, Entity};
use rusqlite::Connection;
use std::collections::BTreeMap;

/// Authors matching `:first_name` and `:last_name` exactly.
pub const FIND_AUTHOR_BY_NAME: &str = "find_by_name";
/// Every author.
pub const AUTHOR_FIND_ALL: &str = "author_find_all";
/// Books matching `:title` exactly.
pub const FIND_BOOK_BY_TITLE: &str = "find_by_title";
/// Every book.
pub const BOOK_FIND_ALL: &str = "book_find_all";

/// One registered query template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedQuery {
    name: String,
    entity: &'static str,
    sql: String,
}

impl NamedQuery {
    /// Creates a template returning rows of `E`.
    pub fn for_entity<E: Entity>(name: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entity: E::NAME,
            sql: sql.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entity(&self) -> &'static str {
        self.entity
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }
}

/// Named query registry shared by every session of a factory.
#[derive(Debug, Clone, Default)]
pub struct QueryCatalog {
    queries: BTreeMap<String, NamedQuery>,
}

impl QueryCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with the author and book templates used by the DAOs.
    pub fn standard() -> Self {
        let author_select = select_clause::<Author>();
        let book_select = select_clause::<Book>();
        let mut catalog = Self::new();
        for query in [
            NamedQuery::for_entity::<Author>(
                FIND_AUTHOR_BY_NAME,
                format!("{author_select} WHERE first_name = :first_name AND last_name = :last_name"),
            ),
            NamedQuery::for_entity::<Author>(AUTHOR_FIND_ALL, author_select),
            NamedQuery::for_entity::<Book>(
                FIND_BOOK_BY_TITLE,
                format!("{book_select} WHERE title = :title"),
            ),
            NamedQuery::for_entity::<Book>(BOOK_FIND_ALL, book_select),
        ] {
            catalog.queries.insert(query.name.clone(), query);
        }
        catalog
    }

    /// Adds a template.
    ///
    /// # Errors
    /// - `InvalidQuery` when the name is already registered.
    pub fn register(&mut self, query: NamedQuery) -> DaoResult<()> {
        if self.queries.contains_key(query.name()) {
            return Err(DaoError::InvalidQuery(format!(
                "named query `{}` is already registered",
                query.name()
            )));
        }
        self.queries.insert(query.name.clone(), query);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&NamedQuery> {
        self.queries.get(name)
    }

    /// Looks up `name` and checks that it returns rows of `E`.
    pub fn resolve<E: Entity>(&self, name: &str) -> DaoResult<&NamedQuery> {
        let query = self
            .get(name)
            .ok_or_else(|| DaoError::InvalidQuery(format!("unknown named query `{name}`")))?;
        if query.entity != E::NAME {
            return Err(DaoError::InvalidQuery(format!(
                "named query `{name}` returns {} rows, not {}",
                query.entity,
                E::NAME
            )));
        }
        Ok(query)
    }

    /// Registered names in lexical order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.queries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Compiles every template against `conn`, surfacing the first failure.
    pub fn precompile(&self, conn: &Connection) -> DaoResult<()> {
        for query in self.queries.values() {
            conn.prepare(&query.sql).map_err(|err| {
                DaoError::InvalidQuery(format!(
                    "named query `{}` does not compile: {err}",
                    query.name
                ))
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{NamedQuery, QueryCatalog, AUTHOR_FIND_ALL, FIND_BOOK_BY_TITLE};
    use crate::error::DaoError;
    use crate::model::author::Author;
    use crate::model::book::Book;

    #[test]
    fn standard_catalog_registers_the_four_dao_queries() {
        let catalog = QueryCatalog::standard();
        let names: Vec<_> = catalog.names().collect();
        assert_eq!(
            names,
            vec!["author_find_all", "book_find_all", "find_by_name", "find_by_title"]
        );
        assert_eq!(catalog.get(FIND_BOOK_BY_TITLE).unwrap().entity(), "Book");
    }

    #[test]
    fn register_rejects_duplicate_names() {
        let mut catalog = QueryCatalog::standard();
        let err = catalog
            .register(NamedQuery::for_entity::<Author>(AUTHOR_FIND_ALL, "SELECT 1"))
            .unwrap_err();
        assert!(matches!(err, DaoError::InvalidQuery(message) if message.contains("already")));
        assert_eq!(catalog.len(), 4);
    }

    #[test]
    fn resolve_checks_entity_type() {
        let catalog = QueryCatalog::standard();
        assert!(catalog.resolve::<Book>(FIND_BOOK_BY_TITLE).is_ok());
        assert!(matches!(
            catalog.resolve::<Author>(FIND_BOOK_BY_TITLE),
            Err(DaoError::InvalidQuery(_))
        ));
        assert!(matches!(
            catalog.resolve::<Author>("missing"),
            Err(DaoError::InvalidQuery(_))
        ));
    }

    #[test]
    fn precompile_reports_broken_templates() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let mut catalog = QueryCatalog::new();
        assert!(catalog.is_empty());
        catalog
            .register(NamedQuery::for_entity::<Author>("broken", "SELECT * FROM nowhere"))
            .unwrap();

        let err = catalog.precompile(&conn).unwrap_err();
        assert!(err.to_string().contains("broken"));
    }
}
