//! Session factories.
//!
//! # Responsibility
//! - Produce one fresh `Session` per call, bound to the configured store.
//! - Bootstrap the store (pragmas, migrations, catalog validation) once.
//!
//! # Invariants
//! - Every session sees a schema at the latest migration version.
//! - In-memory stores live as long as the factory that created them.

use super::{Session, SessionListener};
use crate::config::{StoreConfig, StoreLocation};
use crate::db::migrations::apply_migrations;
use crate::db::{ensure_schema_current, open_connection};
use crate::error::{DaoError, DaoResult};
use crate::query::catalog::QueryCatalog;
use log::{error, info};
use rusqlite::Connection;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Source of units-of-work.
///
/// Pooling, if any, is the implementation's concern; callers always treat the
/// returned session as exclusively theirs for one operation.
pub trait SessionFactory {
    fn open_session(&self) -> DaoResult<Session>;
}

impl<F: SessionFactory + ?Sized> SessionFactory for &F {
    fn open_session(&self) -> DaoResult<Session> {
        (**self).open_session()
    }
}

impl<F: SessionFactory + ?Sized> SessionFactory for Arc<F> {
    fn open_session(&self) -> DaoResult<Session> {
        (**self).open_session()
    }
}

/// Factory opening one SQLite connection per session.
pub struct SqliteSessionFactory {
    target: String,
    busy_timeout: Duration,
    foreign_keys: bool,
    catalog: Arc<QueryCatalog>,
    listener: Option<Arc<dyn SessionListener>>,
    next_session_id: AtomicU64,
    // A memdb database is freed when its last connection closes.
    _anchor: Option<Mutex<Connection>>,
}

impl SqliteSessionFactory {
    /// Bootstraps the configured store with the standard query catalog.
    pub fn new(config: &StoreConfig) -> DaoResult<Self> {
        Self::with_catalog(config, QueryCatalog::standard())
    }

    /// Bootstraps the configured store with a caller-provided catalog.
    ///
    /// # Errors
    /// - `StoreUnavailable` when the configuration is invalid or the store
    ///   cannot be opened.
    /// - `InvalidQuery` when a catalog query does not compile.
    /// - `Db` when migrations fail or the store schema is newer than supported.
    pub fn with_catalog(config: &StoreConfig, catalog: QueryCatalog) -> DaoResult<Self> {
        let started_at = Instant::now();
        config
            .validate()
            .map_err(|reason| DaoError::StoreUnavailable { reason })?;

        let (target, in_memory) = match &config.location {
            StoreLocation::File { path } => (path.to_string_lossy().into_owned(), false),
            StoreLocation::Memory => (
                format!(
                    "file:/shelf-{}?vfs=memdb",
                    Uuid::new_v4().simple()
                ),
                true,
            ),
        };

        let mut conn = open_connection(&target, config.busy_timeout(), config.foreign_keys)
            .map_err(store_unavailable)?;
        if let Err(err) = apply_migrations(&mut conn) {
            error!(
                "event=session_factory_init module=session status=error error_code=migration_failed error={}",
                err
            );
            return Err(err.into());
        }
        catalog.precompile(&conn)?;

        info!(
            "event=session_factory_init module=session status=ok mode={} named_queries={} duration_ms={}",
            if in_memory { "memory" } else { "file" },
            catalog.len(),
            started_at.elapsed().as_millis()
        );

        Ok(Self {
            target,
            busy_timeout: config.busy_timeout(),
            foreign_keys: config.foreign_keys,
            catalog: Arc::new(catalog),
            listener: None,
            next_session_id: AtomicU64::new(1),
            _anchor: in_memory.then(|| Mutex::new(conn)),
        })
    }

    /// Installs a lifecycle observer for every session opened afterwards.
    pub fn with_listener(mut self, listener: Arc<dyn SessionListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    pub fn catalog(&self) -> &QueryCatalog {
        &self.catalog
    }
}

impl SessionFactory for SqliteSessionFactory {
    fn open_session(&self) -> DaoResult<Session> {
        let conn = open_connection(&self.target, self.busy_timeout, self.foreign_keys)
            .map_err(store_unavailable)?;
        ensure_schema_current(&conn)?;

        let id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        Ok(Session::open(
            id,
            conn,
            Arc::clone(&self.catalog),
            self.listener.clone(),
        ))
    }
}

fn store_unavailable(err: crate::db::DbError) -> DaoError {
    DaoError::StoreUnavailable {
        reason: err.to_string(),
    }
}
