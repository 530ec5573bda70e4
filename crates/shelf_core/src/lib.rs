//! Data-access layer for authors and books.
//!
//! Every DAO operation acquires its own unit-of-work (`Session`) from a
//! `SessionFactory`, runs inside at most one transaction and releases the
//! session on every exit path.

pub mod config;
pub mod dao;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod query;
pub mod session;

pub use config::{StoreConfig, StoreLocation};
pub use dao::author_dao::{AuthorDao, AuthorDaoImpl};
pub use dao::book_dao::{BookDao, BookDaoImpl};
pub use error::{DaoError, DaoResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::author::{Author, AuthorId};
pub use model::book::{Book, BookId};
pub use model::entity::Entity;
pub use query::catalog::{NamedQuery, QueryCatalog};
pub use query::criteria::{CriteriaQuery, ParameterExpression, Predicate};
pub use query::strategy::{ExactLookup, ExactMatchStrategy};
pub use query::TypedQuery;
pub use session::{
    Session, SessionFactory, SessionListener, SqliteSessionFactory, TransactionOutcome,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
