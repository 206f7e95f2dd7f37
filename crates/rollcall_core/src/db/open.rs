//! Connection bootstrap utilities for SQLite.
//!
//! # Invariants
//! - Returned connections have migrations fully applied.
//! - Every open attempt emits exactly one terminal `db_open` event.

use super::migrations::apply_migrations;
use super::DbResult;
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

/// Opens an attendance database file and applies all pending migrations.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let path = path.as_ref();
    open_with("file", || Connection::open(path))
}

/// Opens a throwaway in-memory attendance database.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_with("memory", Connection::open_in_memory)
}

fn open_with(
    mode: &'static str,
    connect: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let (error_code, err) = match connect() {
        Ok(mut conn) => match bootstrap_connection(&mut conn) {
            Ok(()) => {
                info!(
                    "event=db_open module=db status=ok mode={mode} duration_ms={}",
                    started_at.elapsed().as_millis()
                );
                return Ok(conn);
            }
            Err(err) => ("db_bootstrap_failed", err),
        },
        Err(err) => ("db_open_failed", err.into()),
    };

    error!(
        "event=db_open module=db status=error mode={mode} duration_ms={} error_code={error_code} error={err}",
        started_at.elapsed().as_millis()
    );
    Err(err)
}

fn bootstrap_connection(conn: &mut Connection) -> DbResult<()> {
    conn.busy_timeout(Duration::from_secs(5))?;
    apply_migrations(conn)?;
    Ok(())
}
