//! Change sources and subscriptions feeding the live view.
//!
//! # Responsibility
//! - Produce ordered change batches: an initial snapshot, then increments.
//! - Pump batches into a reconciler until unsubscribed.
//!
//! # Invariants
//! - The first batch of a source describes its full snapshot as insertions.
//! - A subscription never delivers after `unsubscribe()`.
//!
//! # See also
//! - `view::reconciler` for how batches are applied.

use crate::model::change::ChangeBatch;
use crate::repo::attendance_repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod live_query;
pub mod scripted;
pub mod subscription;

pub type FeedResult<T> = Result<T, FeedError>;

#[derive(Debug)]
pub enum FeedError {
    Repo(RepoError),
    Decode(serde_json::Error),
}

impl Display for FeedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "change source query failed: {err}"),
            Self::Decode(err) => write!(f, "change batches could not be decoded: {err}"),
        }
    }
}

impl Error for FeedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Decode(err) => Some(err),
        }
    }
}

impl From<RepoError> for FeedError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value)
    }
}

/// Something that emits ordered change batches on demand.
pub trait ChangeSource {
    /// Returns the changes since the previous poll. May be empty.
    fn poll(&mut self) -> FeedResult<ChangeBatch>;
}

impl<S: ChangeSource + ?Sized> ChangeSource for &mut S {
    fn poll(&mut self) -> FeedResult<ChangeBatch> {
        (**self).poll()
    }
}
