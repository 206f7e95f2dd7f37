//! Attendance submission use-case service.
//!
//! # Responsibility
//! - Turn a submitted form into a stored attendance document.
//! - Accept or reject picked media files before they reach the image
//!   capability.
//!
//! # Invariants
//! - Only signed-in users can submit.
//! - Stored documents start without a timestamp; the store assigns it when
//!   the write is acknowledged.
//! - A failed write is logged and returned; the caller can simply retry.

use crate::capability::{Capabilities, CapabilityError, MediaFile};
use crate::model::record::{DisplayFields, Record, RecordId};
use crate::repo::attendance_repo::{AttendanceRepository, RepoError, RepoResult};
use crate::service::session::{AuthSession, Notice};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Values from the attendance form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttendanceForm {
    pub subject: String,
    pub rollno: String,
    pub name: String,
}

impl AttendanceForm {
    pub fn new(
        subject: impl Into<String>,
        rollno: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            rollno: rollno.into(),
            name: name.into(),
        }
    }

    /// Whether the submit control should be enabled.
    pub fn can_submit(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

#[derive(Debug)]
pub enum SubmitError {
    /// Advisory notice for the user; nothing was written.
    Notice(Notice),
    MissingSubject,
    Write(RepoError),
    Capability(CapabilityError),
}

impl Display for SubmitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Notice(notice) => f.write_str(notice.message()),
            Self::MissingSubject => write!(f, "pick a subject before submitting"),
            Self::Write(err) => write!(f, "error writing attendance record: {err}"),
            Self::Capability(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SubmitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Write(err) => Some(err),
            Self::Capability(err) => Some(err),
            Self::Notice(_) | Self::MissingSubject => None,
        }
    }
}

impl From<Notice> for SubmitError {
    fn from(value: Notice) -> Self {
        Self::Notice(value)
    }
}

/// Successful submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submitted {
    pub id: RecordId,
    pub notice: Notice,
}

pub struct AttendanceService<R: AttendanceRepository> {
    repo: R,
}

impl<R: AttendanceRepository> AttendanceService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Stores one attendance entry for the signed-in user.
    ///
    /// # Errors
    /// - `MissingSubject` when no subject was picked.
    /// - `Notice(MustSignIn)` when nobody is signed in.
    /// - `Write` when the store rejects the document.
    pub fn submit(
        &self,
        session: &AuthSession,
        form: &AttendanceForm,
    ) -> Result<Submitted, SubmitError> {
        if form.subject.trim().is_empty() {
            return Err(SubmitError::MissingSubject);
        }
        session.require_signed_in()?;

        let record = Record::new(DisplayFields {
            profile_pic_url: Some(session.profile_pic_url()),
            ..DisplayFields::attendance(
                form.name.trim(),
                form.subject.trim(),
                form.rollno.trim(),
            )
        });

        match self.repo.create_record(&record) {
            Ok(id) => {
                info!(
                    "event=attendance_submit module=service status=ok record_id={} subject={}",
                    id, record.fields.text
                );
                Ok(Submitted {
                    id,
                    notice: Notice::AttendanceCaptured,
                })
            }
            Err(err) => {
                error!(
                    "event=attendance_submit module=service status=error record_id={} error={}",
                    record.id, err
                );
                Err(SubmitError::Write(err))
            }
        }
    }

    /// Acknowledges pending writes with the store's clock reading.
    pub fn acknowledge_pending(&self, server_ms: i64) -> RepoResult<usize> {
        self.repo.stamp_pending(server_ms)
    }

    /// Deletes one entry by id.
    pub fn delete(&self, id: &RecordId) -> RepoResult<()> {
        self.repo.delete_record(id)
    }

    /// Posts a picked image through the image-message capability.
    ///
    /// # Errors
    /// - `Notice(ImagesOnly)` when the file is not an image.
    /// - `Notice(MustSignIn)` when nobody is signed in.
    /// - `Capability` when no uploader is configured or it fails.
    pub fn submit_image(
        &self,
        session: &AuthSession,
        file: &MediaFile,
        capabilities: &Capabilities,
    ) -> Result<RecordId, SubmitError> {
        if !file.is_image() {
            warn!(
                "event=media_select module=service status=rejected mime_type={}",
                file.mime_type
            );
            return Err(SubmitError::Notice(Notice::ImagesOnly));
        }
        let user = session.require_signed_in()?;
        capabilities
            .save_image_message(&user.display_name, file)
            .map_err(SubmitError::Capability)
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }
}
