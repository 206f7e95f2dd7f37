//! Attendance record model.
//!
//! # Responsibility
//! - Define the canonical attendance record rendered by the live view.
//! - Validate identity and content before persistence.
//!
//! # Invariants
//! - `RecordId` is never empty and never reused for another record.
//! - `sort_key` is epoch milliseconds assigned by the store; `None` means the
//!   write has not been acknowledged yet.
//! - A record carries either non-empty text or an image reference.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Opaque stable identity assigned by the change source.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(String);

impl RecordId {
    /// Wraps an externally assigned identity.
    ///
    /// Surrounding whitespace is trimmed; blank values are rejected.
    pub fn new(value: impl Into<String>) -> Result<Self, RecordValidationError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(RecordValidationError::EmptyId);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Generates a fresh identity for records created by this process.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for RecordId {
    type Error = RecordValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RecordId> for String {
    fn from(value: RecordId) -> Self {
        value.0
    }
}

/// Fields shown in one rendered row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayFields {
    pub name: String,
    /// Subject picked by the student. Also drives the row's curriculum class.
    pub text: String,
    pub rollno: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_pic_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl DisplayFields {
    /// Text-only fields for a submitted attendance entry.
    pub fn attendance(
        name: impl Into<String>,
        subject: impl Into<String>,
        rollno: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            text: subject.into(),
            rollno: rollno.into(),
            profile_pic_url: None,
            image_url: None,
        }
    }

    /// Returns whether the row has anything to show in its message cell.
    pub fn has_content(&self) -> bool {
        !self.text.is_empty() || self.image_url.as_deref().is_some_and(|url| !url.is_empty())
    }
}

/// Canonical attendance record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    /// Server-assigned epoch milliseconds, absent until acknowledged.
    #[serde(rename = "timestamp", default)]
    pub sort_key: Option<i64>,
    #[serde(flatten)]
    pub fields: DisplayFields,
}

impl Record {
    /// Creates an unacknowledged record with a generated identity.
    pub fn new(fields: DisplayFields) -> Self {
        Self::with_id(RecordId::generate(), fields)
    }

    /// Creates an unacknowledged record with a caller-provided identity.
    pub fn with_id(id: RecordId, fields: DisplayFields) -> Self {
        Self {
            id,
            sort_key: None,
            fields,
        }
    }

    /// Sets the server timestamp.
    pub fn stamped(mut self, sort_key: i64) -> Self {
        self.sort_key = Some(sort_key);
        self
    }

    pub fn is_pending(&self) -> bool {
        self.sort_key.is_none()
    }

    /// Validates persistence invariants.
    ///
    /// # Errors
    /// - `EmptyContent` when neither text nor an image is present.
    /// - `NegativeSortKey` when the timestamp is before the epoch.
    pub fn validate(&self) -> Result<(), RecordValidationError> {
        if !self.fields.has_content() {
            return Err(RecordValidationError::EmptyContent(self.id.clone()));
        }
        if let Some(sort_key) = self.sort_key {
            if sort_key < 0 {
                return Err(RecordValidationError::NegativeSortKey {
                    id: self.id.clone(),
                    sort_key,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordValidationError {
    EmptyId,
    EmptyContent(RecordId),
    NegativeSortKey { id: RecordId, sort_key: i64 },
}

impl Display for RecordValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "record id must not be empty"),
            Self::EmptyContent(id) => write!(f, "record {id} has neither text nor image"),
            Self::NegativeSortKey { id, sort_key } => {
                write!(f, "record {id} has negative timestamp {sort_key}")
            }
        }
    }
}

impl Error for RecordValidationError {}

#[cfg(test)]
mod tests {
    use super::{DisplayFields, Record, RecordId, RecordValidationError};

    #[test]
    fn record_id_trims_and_rejects_blank() {
        assert_eq!(RecordId::new("  abc ").unwrap().as_str(), "abc");
        assert_eq!(RecordId::new("   "), Err(RecordValidationError::EmptyId));
    }

    #[test]
    fn generated_ids_are_distinct() {
        assert_ne!(RecordId::generate(), RecordId::generate());
    }

    #[test]
    fn validate_requires_text_or_image() {
        let mut record = Record::new(DisplayFields::attendance("Asha", "", "12"));
        assert!(matches!(
            record.validate(),
            Err(RecordValidationError::EmptyContent(_))
        ));

        record.fields.image_url = Some("https://img.example/a.png?x=1".to_string());
        record.validate().expect("image-only record is valid");
    }

    #[test]
    fn validate_rejects_negative_timestamp() {
        let record = Record::new(DisplayFields::attendance("Asha", "Maths", "12")).stamped(-5);
        assert!(matches!(
            record.validate(),
            Err(RecordValidationError::NegativeSortKey { sort_key: -5, .. })
        ));
    }

    #[test]
    fn serializes_with_document_field_names() {
        let record = Record::with_id(
            RecordId::new("r1").unwrap(),
            DisplayFields {
                profile_pic_url: Some("/p.png".to_string()),
                ..DisplayFields::attendance("Asha", "Maths", "12")
            },
        )
        .stamped(100);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], "r1");
        assert_eq!(json["timestamp"], 100);
        assert_eq!(json["profilePicUrl"], "/p.png");
        assert!(json.get("imageUrl").is_none());
    }
}
