//! Versioned schema for the shelf store.
//!
//! # Responsibility
//! - Declare the author and book tables as an ordered list of SQL steps.
//! - Bring a store from any older version to [`latest_version`] in one
//!   transaction.
//!
//! # Invariants
//! - Step versions start at 1 and increase by exactly one.
//! - `PRAGMA user_version` always names the last step applied.
//! - A store newer than this binary is never touched.

use crate::db::open::schema_version;
use crate::db::{DbError, DbResult};
use log::{debug, error, info};
use rusqlite::Connection;
use std::time::Instant;

#[derive(Debug, Clone, Copy)]
struct SchemaStep {
    version: u32,
    label: &'static str,
    sql: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[
    SchemaStep {
        version: 1,
        label: "authors",
        sql: include_str!("0001_authors.sql"),
    },
    SchemaStep {
        version: 2,
        label: "books",
        sql: include_str!("0002_books.sql"),
    },
];

/// Returns the latest schema version known by this binary.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |step| step.version)
}

/// Migrates the store behind `conn` to [`latest_version`].
///
/// # Errors
/// - `InvalidMigrationOrder` when the compiled step list is not contiguous.
/// - `UnsupportedSchemaVersion` when the store is newer than this binary.
/// - `Sqlite` when a step fails; no step of the batch is kept.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    check_step_order(SCHEMA_STEPS)?;

    let from_version = schema_version(conn)?;
    let pending = pending_steps(SCHEMA_STEPS, from_version)?;
    if pending.is_empty() {
        debug!("event=db_migrate module=db status=skip version={from_version}");
        return Ok(());
    }

    let started_at = Instant::now();
    let tx = conn.transaction()?;
    for step in pending {
        if let Err(err) = tx
            .execute_batch(step.sql)
            .and_then(|()| tx.pragma_update(None, "user_version", step.version))
        {
            error!(
                "event=db_migrate module=db status=error version={} step={} error={}",
                step.version, step.label, err
            );
            return Err(err.into());
        }
        debug!(
            "event=db_migrate_step module=db status=ok version={} step={}",
            step.version, step.label
        );
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={} to_version={} duration_ms={}",
        from_version,
        latest_version(),
        started_at.elapsed().as_millis()
    );
    Ok(())
}

fn check_step_order(steps: &[SchemaStep]) -> DbResult<()> {
    let mut previous = 0;
    for step in steps {
        if step.version != previous + 1 {
            return Err(DbError::InvalidMigrationOrder {
                previous,
                version: step.version,
            });
        }
        previous = step.version;
    }
    Ok(())
}

fn pending_steps(steps: &[SchemaStep], from_version: u32) -> DbResult<&[SchemaStep]> {
    let latest = steps.last().map_or(0, |step| step.version);
    if from_version > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from_version,
            latest_supported: latest,
        });
    }
    // Contiguous versions make `from_version` the index of the first pending step.
    Ok(&steps[from_version as usize..])
}

#[cfg(test)]
mod tests {
    use super::{check_step_order, pending_steps, SchemaStep, SCHEMA_STEPS};
    use crate::db::DbError;

    const fn step(version: u32) -> SchemaStep {
        SchemaStep {
            version,
            label: "test",
            sql: "",
        }
    }

    #[test]
    fn compiled_steps_are_contiguous() {
        check_step_order(SCHEMA_STEPS).unwrap();
    }

    #[test]
    fn gaps_and_reordering_are_rejected() {
        assert!(matches!(
            check_step_order(&[step(1), step(3)]),
            Err(DbError::InvalidMigrationOrder {
                previous: 1,
                version: 3
            })
        ));
        assert!(matches!(
            check_step_order(&[step(2), step(1)]),
            Err(DbError::InvalidMigrationOrder {
                previous: 0,
                version: 2
            })
        ));
    }

    #[test]
    fn pending_steps_start_after_the_stored_version() {
        let steps = [step(1), step(2), step(3)];
        let versions = |from| {
            pending_steps(&steps, from)
                .unwrap()
                .iter()
                .map(|step| step.version)
                .collect::<Vec<_>>()
        };

        assert_eq!(versions(0), vec![1, 2, 3]);
        assert_eq!(versions(2), vec![3]);
        assert!(versions(3).is_empty());
        assert!(matches!(
            pending_steps(&steps, 4),
            Err(DbError::UnsupportedSchemaVersion {
                db_version: 4,
                latest_supported: 3
            })
        ));
    }
}
