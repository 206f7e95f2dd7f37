//! Repository layer contracts and SQLite implementations.
//!
//! # Responsibility
//! - Define use-case oriented access to the attendance collection.
//! - Isolate SQLite query details from services and change feeds.
//!
//! # Invariants
//! - Repository writes must enforce `Record::validate()` before persistence.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.
//!
//! # See also
//! - `db::migrations` for the tables these repositories read.

pub mod attendance_repo;
pub mod device_token_repo;
