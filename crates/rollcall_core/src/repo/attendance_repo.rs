//! Attendance repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Store submitted attendance documents.
//! - Assign server timestamps when pending writes are acknowledged.
//! - Serve the ordered query that backs the live view.
//!
//! # Invariants
//! - Write paths call `Record::validate()` before SQL mutations.
//! - Ordered reads sort by `timestamp ASC`, unstamped rows last, then by
//!   insertion order.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::record::{DisplayFields, Record, RecordId, RecordValidationError};
use log::{error, info};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const RECORD_SELECT_SQL: &str = "SELECT
    id,
    name,
    text,
    rollno,
    profile_pic_url,
    image_url,
    timestamp
FROM attendance";

const ORDERED_CLAUSE: &str = "ORDER BY timestamp IS NULL, timestamp ASC, seq ASC";

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for attendance persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(RecordValidationError),
    Db(DbError),
    NotFound(RecordId),
    DuplicateId(RecordId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "attendance record not found: {id}"),
            Self::DuplicateId(id) => write!(f, "attendance record already exists: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted attendance data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::DuplicateId(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<RecordValidationError> for RepoError {
    fn from(value: RecordValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for the attendance collection.
pub trait AttendanceRepository {
    /// Stores a new record. An absent `sort_key` leaves the write pending.
    fn create_record(&self, record: &Record) -> RepoResult<RecordId>;
    /// Assigns `server_ms` to every pending record; returns how many changed.
    fn stamp_pending(&self, server_ms: i64) -> RepoResult<usize>;
    fn update_fields(&self, id: &RecordId, fields: &DisplayFields) -> RepoResult<()>;
    fn get_record(&self, id: &RecordId) -> RepoResult<Option<Record>>;
    fn list_ordered(&self, limit: Option<u32>) -> RepoResult<Vec<Record>>;
    fn delete_record(&self, id: &RecordId) -> RepoResult<()>;
}

/// SQLite-backed attendance repository.
pub struct SqliteAttendanceRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAttendanceRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl AttendanceRepository for SqliteAttendanceRepository<'_> {
    fn create_record(&self, record: &Record) -> RepoResult<RecordId> {
        record.validate()?;

        let inserted = self.conn.execute(
            "INSERT INTO attendance (
                id,
                name,
                text,
                rollno,
                profile_pic_url,
                image_url,
                timestamp
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT (id) DO NOTHING;",
            params![
                record.id.as_str(),
                record.fields.name.as_str(),
                record.fields.text.as_str(),
                record.fields.rollno.as_str(),
                record.fields.profile_pic_url.as_deref(),
                record.fields.image_url.as_deref(),
                record.sort_key,
            ],
        );

        match inserted {
            Ok(0) => Err(RepoError::DuplicateId(record.id.clone())),
            Ok(_) => Ok(record.id.clone()),
            Err(err) => {
                error!(
                    "event=attendance_write module=repo status=error record_id={} error={}",
                    record.id, err
                );
                Err(err.into())
            }
        }
    }

    fn stamp_pending(&self, server_ms: i64) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "UPDATE attendance
             SET
                timestamp = ?1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE timestamp IS NULL;",
            [server_ms],
        )?;
        if changed > 0 {
            info!(
                "event=attendance_ack module=repo status=ok stamped={} server_ms={}",
                changed, server_ms
            );
        }
        Ok(changed)
    }

    fn update_fields(&self, id: &RecordId, fields: &DisplayFields) -> RepoResult<()> {
        Record::with_id(id.clone(), fields.clone()).validate()?;

        let changed = self.conn.execute(
            "UPDATE attendance
             SET
                name = ?1,
                text = ?2,
                rollno = ?3,
                profile_pic_url = ?4,
                image_url = ?5,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?6;",
            params![
                fields.name.as_str(),
                fields.text.as_str(),
                fields.rollno.as_str(),
                fields.profile_pic_url.as_deref(),
                fields.image_url.as_deref(),
                id.as_str(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id.clone()));
        }
        Ok(())
    }

    fn get_record(&self, id: &RecordId) -> RepoResult<Option<Record>> {
        let record = self
            .conn
            .query_row(
                &format!("{RECORD_SELECT_SQL} WHERE id = ?1;"),
                [id.as_str()],
                |row| Ok(parse_record_row(row)),
            )
            .optional()?;
        record.transpose()
    }

    fn list_ordered(&self, limit: Option<u32>) -> RepoResult<Vec<Record>> {
        let sql = match limit {
            Some(limit) => format!("{RECORD_SELECT_SQL} {ORDERED_CLAUSE} LIMIT {limit};"),
            None => format!("{RECORD_SELECT_SQL} {ORDERED_CLAUSE};"),
        };

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_record_row(row)?);
        }
        Ok(records)
    }

    fn delete_record(&self, id: &RecordId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM attendance WHERE id = ?1;", [id.as_str()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id.clone()));
        }
        info!("event=record_delete module=repo status=ok record_id={id}");
        Ok(())
    }
}

fn parse_record_row(row: &Row<'_>) -> RepoResult<Record> {
    let id_text: String = row.get("id")?;
    let id = RecordId::new(id_text.as_str()).map_err(|_| {
        RepoError::InvalidData(format!("invalid id `{id_text}` in attendance.id"))
    })?;

    let record = Record {
        id,
        sort_key: row.get("timestamp")?,
        fields: DisplayFields {
            name: row.get("name")?,
            text: row.get("text")?,
            rollno: row.get("rollno")?,
            profile_pic_url: row.get("profile_pic_url")?,
            image_url: row.get("image_url")?,
        },
    };
    record
        .validate()
        .map_err(|err| RepoError::InvalidData(err.to_string()))?;
    Ok(record)
}
