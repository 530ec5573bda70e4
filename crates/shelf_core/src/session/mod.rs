//! Unit-of-work over one SQLite connection.
//!
//! # Responsibility
//! - Own the connection, identity map and transaction state of one operation.
//! - Provide entity persistence primitives (`find`, `persist`, `merge`,
//!   `remove`) and query entry points.
//! - Demarcate transactions through a single helper.
//!
//! # Invariants
//! - A session is released exactly once, on drop, whatever the exit path.
//! - A transaction begun by `in_transaction` is committed or rolled back
//!   before the helper returns; a session never closes with one still open.
//! - Statements execute eagerly, so identities are visible right after
//!   `persist` returns.

mod factory;
mod identity_map;

pub use factory::{SessionFactory, SqliteSessionFactory};

use crate::error::{DaoError, DaoResult};
use crate::model::entity::{select_clause, Entity, ID_COLUMN};
use crate::query::catalog::QueryCatalog;
use crate::query::criteria::CriteriaQuery;
use crate::query::TypedQuery;
use identity_map::IdentityMap;
use log::{debug, error, warn};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Transaction, TransactionBehavior};
use std::cell::RefCell;
use std::sync::Arc;
use std::time::Instant;

/// Final state of a transaction demarcated by [`Session::in_transaction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionOutcome {
    Committed,
    RolledBack,
}

impl TransactionOutcome {
    fn as_str(self) -> &'static str {
        match self {
            Self::Committed => "committed",
            Self::RolledBack => "rolled_back",
        }
    }
}

/// Observer of session lifecycle events.
///
/// Installed on a factory with [`SqliteSessionFactory::with_listener`].
pub trait SessionListener: Send + Sync {
    fn session_opened(&self, _session_id: u64) {}
    fn session_closed(&self, _session_id: u64) {}
    fn transaction_finished(&self, _session_id: u64, _outcome: TransactionOutcome) {}
}

/// Short-lived unit-of-work.
pub struct Session {
    id: u64,
    conn: Connection,
    catalog: Arc<QueryCatalog>,
    identity_map: RefCell<IdentityMap>,
    listener: Option<Arc<dyn SessionListener>>,
    opened_at: Instant,
}

impl Session {
    pub(crate) fn open(
        id: u64,
        conn: Connection,
        catalog: Arc<QueryCatalog>,
        listener: Option<Arc<dyn SessionListener>>,
    ) -> Self {
        debug!("event=session_open module=session status=ok session_id={id}");
        if let Some(listener) = &listener {
            listener.session_opened(id);
        }
        Self {
            id,
            conn,
            catalog,
            identity_map: RefCell::new(IdentityMap::default()),
            listener,
            opened_at: Instant::now(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn catalog(&self) -> &QueryCatalog {
        &self.catalog
    }

    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn is_transaction_active(&self) -> bool {
        !self.conn.is_autocommit()
    }

    /// Returns whether the entity with `id` is managed by this session.
    pub fn contains<E: Entity>(&self, id: i64) -> bool {
        self.identity_map.borrow().contains::<E>(id)
    }

    /// Number of managed entities.
    pub fn managed_count(&self) -> usize {
        self.identity_map.borrow().len()
    }

    /// Loads an entity by identity, consulting the identity map first.
    pub fn find<E: Entity>(&self, id: i64) -> DaoResult<Option<E>> {
        if let Some(entity) = self.identity_map.borrow().get::<E>(id) {
            return Ok(Some(entity));
        }

        let sql = format!("{} WHERE {ID_COLUMN} = :id", select_clause::<E>());
        let rows = TypedQuery::<E>::new(self, "find", sql)
            .set_parameter("id", id)
            .get_result_list()?;
        Ok(rows.into_iter().next())
    }

    /// Inserts a transient entity and assigns its store-generated identity.
    ///
    /// # Errors
    /// - `NotTransient` when the entity already has an identity.
    /// - `ConstraintViolation` when the store rejects the row.
    pub fn persist<E: Entity>(&self, entity: &mut E) -> DaoResult<()> {
        if let Some(id) = entity.id() {
            return Err(DaoError::NotTransient {
                entity: E::NAME,
                id,
            });
        }

        let placeholders = (1..=E::COLUMNS.len())
            .map(|index| format!("?{index}"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({placeholders});",
            E::TABLE,
            E::COLUMNS.join(", ")
        );
        let values = entity.column_values();
        self.conn
            .prepare_cached(&sql)?
            .execute(params_from_iter(values.iter()))
            .map_err(|err| DaoError::from(err).for_entity(E::NAME))?;

        entity.assign_id(self.conn.last_insert_rowid());
        self.identity_map.borrow_mut().put(entity);
        Ok(())
    }

    /// Copies the entity's field values onto its stored row.
    ///
    /// # Errors
    /// - `MissingIdentity` for transient entities.
    /// - `NotFound` when no row carries the identity.
    pub fn merge<E: Entity>(&self, entity: &E) -> DaoResult<()> {
        let id = entity
            .id()
            .ok_or(DaoError::MissingIdentity { entity: E::NAME })?;

        let assignments = E::COLUMNS
            .iter()
            .enumerate()
            .map(|(index, column)| format!("{column} = ?{}", index + 1))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {assignments} WHERE {ID_COLUMN} = ?{};",
            E::TABLE,
            E::COLUMNS.len() + 1
        );
        let mut values = entity.column_values();
        values.push(Value::Integer(id));

        let changed = self
            .conn
            .prepare_cached(&sql)?
            .execute(params_from_iter(values.iter()))
            .map_err(|err| DaoError::from(err).for_entity(E::NAME))?;
        if changed == 0 {
            return Err(not_found::<E>(id));
        }

        self.identity_map.borrow_mut().put(entity);
        Ok(())
    }

    /// Deletes the entity's row and stops managing it.
    pub fn remove<E: Entity>(&self, entity: &E) -> DaoResult<()> {
        let id = entity
            .id()
            .ok_or(DaoError::MissingIdentity { entity: E::NAME })?;

        let sql = format!("DELETE FROM {} WHERE {ID_COLUMN} = ?1;", E::TABLE);
        let changed = self
            .conn
            .prepare_cached(&sql)?
            .execute([id])
            .map_err(|err| DaoError::from(err).for_entity(E::NAME))?;
        if changed == 0 {
            return Err(not_found::<E>(id));
        }

        self.identity_map.borrow_mut().evict::<E>(id);
        Ok(())
    }

    /// Detaches every managed entity; later `find` calls hit the store.
    pub fn clear(&self) {
        self.identity_map.borrow_mut().clear();
    }

    pub fn create_named_query<E: Entity>(&self, name: &str) -> DaoResult<TypedQuery<'_, E>> {
        let query = self.catalog.resolve::<E>(name)?;
        Ok(TypedQuery::new(self, query.name(), query.sql()))
    }

    pub fn create_query<E: Entity>(&self, sql: impl Into<String>) -> TypedQuery<'_, E> {
        TypedQuery::new(self, "ad_hoc", sql)
    }

    pub fn create_criteria_query<E: Entity>(
        &self,
        criteria: &CriteriaQuery<E>,
    ) -> DaoResult<TypedQuery<'_, E>> {
        Ok(TypedQuery::new(self, "criteria", criteria.to_sql()?))
    }

    /// Runs `work` inside one immediate transaction.
    ///
    /// Commits when `work` succeeds; rolls back before returning the error
    /// when `work` or the commit fails. An unwinding panic rolls back through
    /// the transaction guard.
    ///
    /// # Errors
    /// - `NestedTransaction` when a transaction is already active.
    pub fn in_transaction<T>(&self, work: impl FnOnce(&Session) -> DaoResult<T>) -> DaoResult<T> {
        if self.is_transaction_active() {
            return Err(DaoError::NestedTransaction);
        }

        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
        match work(self) {
            Ok(value) => match tx.commit() {
                Ok(()) => {
                    self.finish_transaction(TransactionOutcome::Committed);
                    Ok(value)
                }
                Err(err) => {
                    // Dropping the failed guard already rolled back.
                    error!(
                        "event=tx_commit module=session status=error session_id={} error={}",
                        self.id, err
                    );
                    self.finish_transaction(TransactionOutcome::RolledBack);
                    Err(err.into())
                }
            },
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    error!(
                        "event=tx_rollback module=session status=error session_id={} error={}",
                        self.id, rollback_err
                    );
                }
                self.finish_transaction(TransactionOutcome::RolledBack);
                Err(err)
            }
        }
    }

    pub(crate) fn manage_all<E: Entity>(&self, entities: &[E]) {
        let mut identity_map = self.identity_map.borrow_mut();
        for entity in entities {
            identity_map.put(entity);
        }
    }

    fn finish_transaction(&self, outcome: TransactionOutcome) {
        debug!(
            "event=tx_finish module=session status=ok session_id={} outcome={}",
            self.id,
            outcome.as_str()
        );
        if let Some(listener) = &self.listener {
            listener.transaction_finished(self.id, outcome);
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.conn.is_autocommit() {
            warn!(
                "event=session_close module=session status=warn session_id={} reason=open_transaction",
                self.id
            );
            if let Err(err) = self.conn.execute_batch("ROLLBACK;") {
                error!(
                    "event=tx_rollback module=session status=error session_id={} error={}",
                    self.id, err
                );
            }
            self.finish_transaction(TransactionOutcome::RolledBack);
        }

        let identity_map = self.identity_map.get_mut();
        let managed = identity_map.len();
        identity_map.clear();
        debug!(
            "event=session_close module=session status=ok session_id={} duration_ms={} managed={}",
            self.id,
            self.opened_at.elapsed().as_millis(),
            managed
        );
        if let Some(listener) = &self.listener {
            listener.session_closed(self.id);
        }
    }
}

pub(crate) fn not_found<E: Entity>(id: i64) -> DaoError {
    DaoError::NotFound {
        entity: E::NAME,
        key: format!("{ID_COLUMN}={id}"),
    }
}
