//! Connection bootstrap utilities for SQLite.
//!
//! # Responsibility
//! - Open file-backed or memdb-backed SQLite connections.
//! - Configure connection pragmas required by the session layer.
//!
//! # Invariants
//! - Returned connections honor the requested `foreign_keys` setting.
//! - `LIKE` compares case-sensitively on every returned connection.
//! - Returned connections carry the configured busy timeout.

use super::migrations::latest_version;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::time::{Duration, Instant};

/// Opens and configures one SQLite connection.
///
/// `target` is either a filesystem path or a `file:` URI naming a `memdb`
/// database. Both use file-level locking, so contended connections wait up
/// to `busy_timeout`. Migrations are not applied here; see
/// [`super::migrations::apply_migrations`].
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_connection(
    target: &str,
    busy_timeout: Duration,
    foreign_keys: bool,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    let mode = if target.starts_with("file:") {
        "memory"
    } else {
        "file"
    };

    let conn = match Connection::open(target) {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_open_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    let pragmas = format!(
        "PRAGMA foreign_keys = {};\nPRAGMA case_sensitive_like = ON;",
        if foreign_keys { "ON" } else { "OFF" }
    );
    if let Err(err) = conn
        .execute_batch(&pragmas)
        .and_then(|()| conn.busy_timeout(busy_timeout))
    {
        error!(
            "event=db_open module=db status=error mode={} duration_ms={} error_code=db_configure_failed error={}",
            mode,
            started_at.elapsed().as_millis(),
            err
        );
        return Err(err.into());
    }

    info!(
        "event=db_open module=db status=ok mode={} duration_ms={}",
        mode,
        started_at.elapsed().as_millis()
    );
    Ok(conn)
}

/// Reads the schema version recorded in `PRAGMA user_version`.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

/// Rejects connections whose schema was not migrated by this binary.
pub fn ensure_schema_current(conn: &Connection) -> DbResult<()> {
    let db_version = schema_version(conn)?;
    let expected_version = latest_version();
    if db_version != expected_version {
        return Err(DbError::SchemaNotCurrent {
            db_version,
            expected_version,
        });
    }
    Ok(())
}
