//! Data-access objects for authors and books.
//!
//! # Responsibility
//! - Expose the per-entity operation contracts (`AuthorDao`, `BookDao`).
//! - Scope every operation to exactly one session.
//!
//! # Invariants
//! - A session is acquired per call and released on every exit path.
//! - Mutations run inside one transaction that is committed or rolled back
//!   before the session is released.
//! - Logs carry operation names and error codes, never field values.

pub mod author_dao;
pub mod book_dao;

use crate::error::{DaoError, DaoResult};
use crate::session::{Session, SessionFactory};
use log::{debug, error, info, warn};
use std::time::Instant;

/// Runs `work` on a fresh session from `factory`.
pub(crate) fn scoped<F, T>(
    factory: &F,
    op: &'static str,
    work: impl FnOnce(&Session) -> DaoResult<T>,
) -> DaoResult<T>
where
    F: SessionFactory + ?Sized,
{
    let started_at = Instant::now();
    let session = match factory.open_session() {
        Ok(session) => session,
        Err(err) => {
            error!(
                "event=dao_call module=dao op={} status=error error_code={} duration_ms={} error={}",
                op,
                err.code(),
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err);
        }
    };

    let session_id = session.id();
    let result = work(&session);
    drop(session);

    let duration_ms = started_at.elapsed().as_millis();
    match &result {
        Ok(_) => debug!(
            "event=dao_call module=dao op={op} status=ok session_id={session_id} duration_ms={duration_ms}"
        ),
        Err(err @ (DaoError::NotFound { .. } | DaoError::AmbiguousResult { .. })) => info!(
            "event=dao_call module=dao op={op} status=miss session_id={session_id} error_code={} duration_ms={duration_ms}",
            err.code()
        ),
        Err(err) => warn!(
            "event=dao_call module=dao op={op} status=error session_id={session_id} error_code={} duration_ms={duration_ms}",
            err.code()
        ),
    }
    result
}

/// Runs `work` on a fresh session inside one transaction.
pub(crate) fn scoped_transaction<F, T>(
    factory: &F,
    op: &'static str,
    work: impl FnOnce(&Session) -> DaoResult<T>,
) -> DaoResult<T>
where
    F: SessionFactory + ?Sized,
{
    scoped(factory, op, |session| session.in_transaction(work))
}
