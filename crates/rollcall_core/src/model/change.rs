//! Change events delivered by a change source.
//!
//! # Responsibility
//! - Define the inbound wire shape (`RawChange`) exactly as a source emits it.
//! - Validate raw events into typed `RecordChange` values one at a time, so a
//!   corrupt event can be rejected without dropping its batch.
//!
//! # Invariants
//! - `inserted` and `modified` events always carry a record after validation.
//! - Batch order is delivery order; nothing here reorders events.

use crate::model::record::{DisplayFields, Record, RecordId};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Inserted,
    Modified,
    Removed,
}

impl ChangeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inserted => "inserted",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }
}

/// Record body carried by `inserted`/`modified` events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(flatten)]
    pub fields: DisplayFields,
}

/// One change event as received, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawChange {
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    #[serde(default)]
    pub identity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<RecordPayload>,
}

impl RawChange {
    pub fn inserted(record: &Record) -> Self {
        Self::with_record(ChangeKind::Inserted, record)
    }

    pub fn modified(record: &Record) -> Self {
        Self::with_record(ChangeKind::Modified, record)
    }

    pub fn removed(id: &RecordId) -> Self {
        Self {
            kind: ChangeKind::Removed,
            identity: Some(id.to_string()),
            record: None,
        }
    }

    fn with_record(kind: ChangeKind, record: &Record) -> Self {
        Self {
            kind,
            identity: Some(record.id.to_string()),
            record: Some(RecordPayload {
                timestamp: record.sort_key,
                fields: record.fields.clone(),
            }),
        }
    }
}

/// Validated change event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordChange {
    Inserted(Record),
    Modified(Record),
    Removed(RecordId),
}

impl RecordChange {
    pub fn id(&self) -> &RecordId {
        match self {
            Self::Inserted(record) | Self::Modified(record) => &record.id,
            Self::Removed(id) => id,
        }
    }

    pub fn kind(&self) -> ChangeKind {
        match self {
            Self::Inserted(_) => ChangeKind::Inserted,
            Self::Modified(_) => ChangeKind::Modified,
            Self::Removed(_) => ChangeKind::Removed,
        }
    }
}

impl TryFrom<RawChange> for RecordChange {
    type Error = MalformedChange;

    fn try_from(raw: RawChange) -> Result<Self, Self::Error> {
        let kind = raw.kind;
        let identity = raw
            .identity
            .ok_or(MalformedChange::MissingIdentity { kind })?;
        let id = RecordId::new(identity).map_err(|_| MalformedChange::MissingIdentity { kind })?;

        if kind == ChangeKind::Removed {
            return Ok(Self::Removed(id));
        }

        let payload = raw
            .record
            .ok_or_else(|| MalformedChange::MissingRecord {
                kind,
                id: id.clone(),
            })?;
        let record = Record {
            id,
            sort_key: payload.timestamp,
            fields: payload.fields,
        };

        Ok(match kind {
            ChangeKind::Inserted => Self::Inserted(record),
            _ => Self::Modified(record),
        })
    }
}

impl From<&RecordChange> for RawChange {
    fn from(change: &RecordChange) -> Self {
        match change {
            RecordChange::Inserted(record) => RawChange::inserted(record),
            RecordChange::Modified(record) => RawChange::modified(record),
            RecordChange::Removed(id) => RawChange::removed(id),
        }
    }
}

/// Why one raw event could not be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedChange {
    MissingIdentity { kind: ChangeKind },
    MissingRecord { kind: ChangeKind, id: RecordId },
    /// Element did not match the wire shape at all.
    Undecodable { index: usize, reason: String },
}

impl Display for MalformedChange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingIdentity { kind } => {
                write!(f, "{} event has no identity", kind.as_str())
            }
            Self::MissingRecord { kind, id } => {
                write!(f, "{} event for {id} has no record", kind.as_str())
            }
            Self::Undecodable { index, reason } => {
                write!(f, "event #{index} could not be decoded: {reason}")
            }
        }
    }
}

impl Error for MalformedChange {}

/// One notification from a change source.
///
/// Decoding is per event: an element that does not match the wire shape is
/// kept in `undecodable` and the remaining elements still decode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeBatch {
    pub changes: Vec<RawChange>,
    /// Elements that failed to decode, with their position in the batch.
    pub undecodable: Vec<MalformedChange>,
}

impl ChangeBatch {
    pub fn new(changes: Vec<RawChange>) -> Self {
        Self {
            changes,
            undecodable: Vec::new(),
        }
    }

    /// Decodes wire elements one at a time.
    pub fn from_wire(elements: Vec<serde_json::Value>) -> Self {
        let mut batch = Self::default();
        for (index, element) in elements.into_iter().enumerate() {
            match serde_json::from_value::<RawChange>(element) {
                Ok(change) => batch.changes.push(change),
                Err(err) => batch.undecodable.push(MalformedChange::Undecodable {
                    index,
                    reason: err.to_string(),
                }),
            }
        }
        batch
    }

    /// Number of decoded changes.
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.undecodable.is_empty()
    }
}

impl Serialize for ChangeBatch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.changes.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ChangeBatch {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let elements = Vec::<serde_json::Value>::deserialize(deserializer)?;
        Ok(Self::from_wire(elements))
    }
}

impl FromIterator<RawChange> for ChangeBatch {
    fn from_iter<T: IntoIterator<Item = RawChange>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
