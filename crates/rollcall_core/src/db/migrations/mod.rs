//! Attendance schema steps and the runner that applies them.
//!
//! # Responsibility
//! - List the schema steps for the attendance store, oldest first.
//! - Bring a connection up to the newest step inside one transaction.
//!
//! # Invariants
//! - Step versions start at 1 and increase by exactly one.
//! - `PRAGMA user_version` always equals the last step applied.
//! - A database stamped with a newer version is never touched.
//!
//! # See also
//! - `db::open` for the connection bootstrap that calls the runner.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

#[derive(Debug, Clone, Copy)]
struct SchemaStep {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[
    SchemaStep {
        version: 1,
        name: "attendance",
        sql: include_str!("0001_attendance.sql"),
    },
    SchemaStep {
        version: 2,
        name: "device_tokens",
        sql: include_str!("0002_device_tokens.sql"),
    },
];

/// Newest schema version this build can write.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |step| step.version)
}

/// Applies every step newer than the stored version.
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the file was written by a newer build.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let stored = stored_version(conn)?;
    let latest = latest_version();
    if stored > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: stored,
            latest_supported: latest,
        });
    }

    let pending: Vec<&SchemaStep> = SCHEMA_STEPS
        .iter()
        .filter(|step| step.version > stored)
        .collect();
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for step in &pending {
        tx.execute_batch(step.sql)?;
        tx.pragma_update(None, "user_version", step.version)?;
        info!(
            "event=migrate module=db status=ok version={} step={}",
            step.version, step.name
        );
    }
    tx.commit()?;
    Ok(())
}

fn stored_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?)
}
