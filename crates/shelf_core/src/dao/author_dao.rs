//! Author data-access contract and session-backed implementation.
//!
//! # Responsibility
//! - CRUD for `Author` plus name and last-name-prefix lookups.
//!
//! # Invariants
//! - `find_author_by_name` and `find_author_by_name_criteria` agree for any
//!   input (same row or same error kind).
//! - `delete_author_by_id` never removes a reference it could not load.

use super::{scoped, scoped_transaction};
use crate::error::{DaoError, DaoResult};
use crate::model::author::{Author, AuthorId};
use crate::model::entity::Entity;
use crate::query::catalog::{AUTHOR_FIND_ALL, FIND_AUTHOR_BY_NAME};
use crate::query::find_by_prefix;
use crate::query::strategy::{ExactLookup, ExactMatchStrategy};
use crate::session::{not_found, SessionFactory};

/// Operations callers may depend on for authors.
pub trait AuthorDao {
    /// Loads one author by identity.
    fn get_by_id(&self, id: AuthorId) -> DaoResult<Author>;
    /// Exact name match through the `find_by_name` catalog query.
    fn find_author_by_name(&self, first_name: &str, last_name: &str) -> DaoResult<Author>;
    /// Exact name match through a predicate built at call time.
    fn find_author_by_name_criteria(&self, first_name: &str, last_name: &str)
        -> DaoResult<Author>;
    /// Authors whose last name starts with `last_name_prefix`.
    fn list_author_by_last_name_like(&self, last_name_prefix: &str) -> DaoResult<Vec<Author>>;
    /// Persists a transient author and returns it with its identity.
    fn save_new_author(&self, author: Author) -> DaoResult<Author>;
    /// Merges a detached author and returns the stored state.
    fn update_author(&self, author: &Author) -> DaoResult<Author>;
    fn delete_author_by_id(&self, id: AuthorId) -> DaoResult<()>;
    fn find_all(&self) -> DaoResult<Vec<Author>>;
}

/// `AuthorDao` opening one session per call from `F`.
pub struct AuthorDaoImpl<F: SessionFactory> {
    factory: F,
}

impl<F: SessionFactory> AuthorDaoImpl<F> {
    pub fn new(factory: F) -> Self {
        Self { factory }
    }

    /// Exact name match with an explicit strategy.
    pub fn find_author_by_name_with(
        &self,
        strategy: ExactMatchStrategy,
        first_name: &str,
        last_name: &str,
    ) -> DaoResult<Author> {
        let lookup = ExactLookup::new(FIND_AUTHOR_BY_NAME)
            .field("first_name", first_name)
            .field("last_name", last_name);
        let op = match strategy {
            ExactMatchStrategy::Precompiled => "author.find_by_name",
            ExactMatchStrategy::Dynamic => "author.find_by_name_criteria",
        };
        scoped(&self.factory, op, |session| {
            strategy.find_one::<Author>(session, &lookup)
        })
    }

    /// Authors whose `attribute` starts with `prefix`.
    ///
    /// # Errors
    /// - `InvalidQuery` when `attribute` is not a mapped author column.
    pub fn find_by_prefix(&self, attribute: &str, prefix: &str) -> DaoResult<Vec<Author>> {
        scoped(&self.factory, "author.find_by_prefix", |session| {
            find_by_prefix::<Author>(session, attribute, prefix)
        })
    }
}

impl<F: SessionFactory> AuthorDao for AuthorDaoImpl<F> {
    fn get_by_id(&self, id: AuthorId) -> DaoResult<Author> {
        scoped(&self.factory, "author.get_by_id", |session| {
            session
                .find::<Author>(id)?
                .ok_or_else(|| not_found::<Author>(id))
        })
    }

    fn find_author_by_name(&self, first_name: &str, last_name: &str) -> DaoResult<Author> {
        self.find_author_by_name_with(ExactMatchStrategy::Precompiled, first_name, last_name)
    }

    fn find_author_by_name_criteria(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> DaoResult<Author> {
        self.find_author_by_name_with(ExactMatchStrategy::Dynamic, first_name, last_name)
    }

    fn list_author_by_last_name_like(&self, last_name_prefix: &str) -> DaoResult<Vec<Author>> {
        self.find_by_prefix("last_name", last_name_prefix)
    }

    fn save_new_author(&self, author: Author) -> DaoResult<Author> {
        if let Some(id) = author.id {
            return Err(DaoError::NotTransient {
                entity: Author::NAME,
                id,
            });
        }

        scoped_transaction(&self.factory, "author.save_new", move |session| {
            let mut author = author;
            session.persist(&mut author)?;
            Ok(author)
        })
    }

    fn update_author(&self, author: &Author) -> DaoResult<Author> {
        let id = author.id.ok_or(DaoError::MissingIdentity {
            entity: Author::NAME,
        })?;

        scoped_transaction(&self.factory, "author.update", |session| {
            session.merge(author)?;
            session.clear();
            session
                .find::<Author>(id)?
                .ok_or_else(|| not_found::<Author>(id))
        })
    }

    fn delete_author_by_id(&self, id: AuthorId) -> DaoResult<()> {
        scoped_transaction(&self.factory, "author.delete", |session| {
            let author = session
                .find::<Author>(id)?
                .ok_or_else(|| not_found::<Author>(id))?;
            session.remove(&author)
        })
    }

    fn find_all(&self) -> DaoResult<Vec<Author>> {
        scoped(&self.factory, "author.find_all", |session| {
            session
                .create_named_query::<Author>(AUTHOR_FIND_ALL)?
                .get_result_list()
        })
    }
}
