//! Book data-access contract and session-backed implementation.
//!
//! # Responsibility
//! - CRUD for `Book` plus title and ISBN lookups.
//!
//! # Invariants
//! - Title lookups have singleton-result semantics: two books sharing a title
//!   fail with `AmbiguousResult` instead of returning either.
//! - Duplicate ISBNs are rejected by the store and surface as
//!   `ConstraintViolation`; the transaction is rolled back.

use super::{scoped, scoped_transaction};
use crate::error::{DaoError, DaoResult};
use crate::model::book::{Book, BookId};
use crate::model::entity::{select_clause, Entity};
use crate::query::catalog::{BOOK_FIND_ALL, FIND_BOOK_BY_TITLE};
use crate::query::strategy::{ExactLookup, ExactMatchStrategy};
use crate::session::{not_found, SessionFactory};

/// Operations callers may depend on for books.
pub trait BookDao {
    fn get_by_id(&self, id: BookId) -> DaoResult<Book>;
    /// Exact ISBN match through ad-hoc query text.
    fn find_by_isbn(&self, isbn: &str) -> DaoResult<Book>;
    /// Exact title match through the `find_by_title` catalog query.
    fn find_book_by_title(&self, title: &str) -> DaoResult<Book>;
    /// Exact title match through a predicate built at call time.
    fn find_book_by_title_criteria(&self, title: &str) -> DaoResult<Book>;
    fn save_new_book(&self, book: Book) -> DaoResult<Book>;
    fn update_book(&self, book: &Book) -> DaoResult<Book>;
    fn delete_book_by_id(&self, id: BookId) -> DaoResult<()>;
    fn find_all(&self) -> DaoResult<Vec<Book>>;
}

/// `BookDao` opening one session per call from `F`.
pub struct BookDaoImpl<F: SessionFactory> {
    factory: F,
}

impl<F: SessionFactory> BookDaoImpl<F> {
    pub fn new(factory: F) -> Self {
        Self { factory }
    }

    /// Exact title match with an explicit strategy.
    pub fn find_book_by_title_with(
        &self,
        strategy: ExactMatchStrategy,
        title: &str,
    ) -> DaoResult<Book> {
        let lookup = ExactLookup::new(FIND_BOOK_BY_TITLE).field("title", title);
        let op = match strategy {
            ExactMatchStrategy::Precompiled => "book.find_by_title",
            ExactMatchStrategy::Dynamic => "book.find_by_title_criteria",
        };
        scoped(&self.factory, op, |session| {
            strategy.find_one::<Book>(session, &lookup)
        })
    }
}

impl<F: SessionFactory> BookDao for BookDaoImpl<F> {
    fn get_by_id(&self, id: BookId) -> DaoResult<Book> {
        scoped(&self.factory, "book.get_by_id", |session| {
            session
                .find::<Book>(id)?
                .ok_or_else(|| not_found::<Book>(id))
        })
    }

    fn find_by_isbn(&self, isbn: &str) -> DaoResult<Book> {
        scoped(&self.factory, "book.find_by_isbn", |session| {
            session
                .create_query::<Book>(format!("{} WHERE isbn = :isbn", select_clause::<Book>()))
                .set_parameter("isbn", isbn.to_string())
                .get_single_result()
        })
    }

    fn find_book_by_title(&self, title: &str) -> DaoResult<Book> {
        self.find_book_by_title_with(ExactMatchStrategy::Precompiled, title)
    }

    fn find_book_by_title_criteria(&self, title: &str) -> DaoResult<Book> {
        self.find_book_by_title_with(ExactMatchStrategy::Dynamic, title)
    }

    fn save_new_book(&self, book: Book) -> DaoResult<Book> {
        if let Some(id) = book.id {
            return Err(DaoError::NotTransient {
                entity: Book::NAME,
                id,
            });
        }

        scoped_transaction(&self.factory, "book.save_new", move |session| {
            let mut book = book;
            session.persist(&mut book)?;
            Ok(book)
        })
    }

    fn update_book(&self, book: &Book) -> DaoResult<Book> {
        let id = book.id.ok_or(DaoError::MissingIdentity { entity: Book::NAME })?;

        scoped_transaction(&self.factory, "book.update", |session| {
            session.merge(book)?;
            session.clear();
            session
                .find::<Book>(id)?
                .ok_or_else(|| not_found::<Book>(id))
        })
    }

    fn delete_book_by_id(&self, id: BookId) -> DaoResult<()> {
        scoped_transaction(&self.factory, "book.delete", |session| {
            let book = session
                .find::<Book>(id)?
                .ok_or_else(|| not_found::<Book>(id))?;
            session.remove(&book)
        })
    }

    fn find_all(&self) -> DaoResult<Vec<Book>> {
        scoped(&self.factory, "book.find_all", |session| {
            session
                .create_named_query::<Book>(BOOK_FIND_ALL)?
                .get_result_list()
        })
    }
}
