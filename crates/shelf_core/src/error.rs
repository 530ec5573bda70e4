//! Error taxonomy shared by sessions, queries and DAOs.
//!
//! # Invariants
//! - Absence of a row is always `NotFound`, never a silent `None` at the DAO
//!   boundary.
//! - Store constraint failures are surfaced as `ConstraintViolation`, store
//!   reachability failures as `StoreUnavailable`.

use crate::db::DbError;
use rusqlite::ErrorCode;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type DaoResult<T> = Result<T, DaoError>;

/// Typed failure surfaced by every data-access operation.
#[derive(Debug)]
pub enum DaoError {
    /// A lookup or mutation target does not exist in the store.
    NotFound { entity: &'static str, key: String },
    /// A singleton-result query matched more than one row.
    AmbiguousResult { entity: &'static str, query: String },
    /// The store rejected a write because of a data constraint.
    ConstraintViolation {
        entity: &'static str,
        message: String,
    },
    /// A session could not be acquired or the store connection failed.
    StoreUnavailable { reason: String },
    /// `create` was handed an entity that already carries an identity.
    NotTransient { entity: &'static str, id: i64 },
    /// `update` was handed an entity without identity.
    MissingIdentity { entity: &'static str },
    /// Query text, catalog lookup, attribute or parameter binding is invalid.
    InvalidQuery(String),
    /// A transaction was requested while one is already active on the session.
    NestedTransaction,
    /// A stored row could not be decoded into an entity.
    InvalidData(String),
    Db(DbError),
}

impl DaoError {
    /// Stable machine-readable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::AmbiguousResult { .. } => "ambiguous_result",
            Self::ConstraintViolation { .. } => "constraint_violation",
            Self::StoreUnavailable { .. } => "store_unavailable",
            Self::NotTransient { .. } => "not_transient",
            Self::MissingIdentity { .. } => "missing_identity",
            Self::InvalidQuery(_) => "invalid_query",
            Self::NestedTransaction => "nested_transaction",
            Self::InvalidData(_) => "invalid_data",
            Self::Db(_) => "db_error",
        }
    }

    /// Re-labels a constraint violation with the entity being written.
    pub(crate) fn for_entity(self, entity: &'static str) -> Self {
        match self {
            Self::ConstraintViolation { message, .. } => {
                Self::ConstraintViolation { entity, message }
            }
            other => other,
        }
    }
}

impl Display for DaoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { entity, key } => write!(f, "{entity} not found: {key}"),
            Self::AmbiguousResult { entity, query } => {
                write!(f, "query `{query}` matched more than one {entity}")
            }
            Self::ConstraintViolation { entity, message } => {
                write!(f, "store rejected {entity} write: {message}")
            }
            Self::StoreUnavailable { reason } => write!(f, "store unavailable: {reason}"),
            Self::NotTransient { entity, id } => {
                write!(f, "{entity} already has identity {id}; create expects a transient entity")
            }
            Self::MissingIdentity { entity } => {
                write!(f, "{entity} has no identity; update expects a persisted entity")
            }
            Self::InvalidQuery(message) => write!(f, "invalid query: {message}"),
            Self::NestedTransaction => write!(f, "a transaction is already active on this session"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DaoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for DaoError {
    fn from(value: DbError) -> Self {
        match value {
            DbError::Sqlite(err) => Self::from(err),
            other => Self::Db(other),
        }
    }
}

impl From<rusqlite::Error> for DaoError {
    fn from(value: rusqlite::Error) -> Self {
        let code = match &value {
            rusqlite::Error::SqliteFailure(err, _) => Some(err.code),
            _ => None,
        };

        match code {
            Some(ErrorCode::ConstraintViolation) => Self::ConstraintViolation {
                entity: "entity",
                message: value.to_string(),
            },
            Some(
                ErrorCode::CannotOpen
                | ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::SystemIoFailure
                | ErrorCode::NotADatabase,
            ) => Self::StoreUnavailable {
                reason: value.to_string(),
            },
            _ => Self::Db(DbError::Sqlite(value)),
        }
    }
}
