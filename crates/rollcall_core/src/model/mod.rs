//! Domain model for attendance records and the changes that move them.
//!
//! # Responsibility
//! - Define the record shape shared by storage, change feeds and the view.
//! - Define the inbound change-event wire shape and its validated form.
//!
//! # Invariants
//! - Every record is identified by a stable, non-empty `RecordId`.
//! - A record without a `sort_key` has not been stamped by the store yet.
//!
//! # See also
//! - `feed` for the sources that emit change batches.

pub mod change;
pub mod record;
