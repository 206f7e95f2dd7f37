//! In-memory presentation sink.
//!
//! Used by the CLI to print the attendance table and by tests to observe
//! exactly which operations the reconciler issued.

use crate::model::record::RecordId;
use crate::view::render::{RenderedSlot, Visibility};
use crate::view::sink::{InsertPosition, PresentationSink};
use log::warn;

/// Default header row of the attendance table.
pub const ATTENDANCE_HEADER: &str = "Pic | Name | Roll No | Subject | Recorded";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkRow {
    pub id: RecordId,
    pub slot: RenderedSlot,
}

/// One operation as received from the reconciler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkOp {
    Insert { id: RecordId, position: InsertPosition },
    Update(RecordId),
    Remove(RecordId),
    Reveal(RecordId),
}

#[derive(Debug, Clone)]
pub struct MemorySink {
    header: String,
    rows: Vec<SinkRow>,
    ops: Vec<SinkOp>,
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::with_header(ATTENDANCE_HEADER)
    }
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            rows: Vec::new(),
            ops: Vec::new(),
        }
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    /// Rows below the header, top to bottom.
    pub fn rows(&self) -> &[SinkRow] {
        &self.rows
    }

    pub fn ids(&self) -> Vec<&str> {
        self.rows.iter().map(|row| row.id.as_str()).collect()
    }

    pub fn row(&self, id: &RecordId) -> Option<&SinkRow> {
        self.rows.iter().find(|row| &row.id == id)
    }

    pub fn ops(&self) -> &[SinkOp] {
        &self.ops
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    fn index_of(&self, id: &RecordId) -> Option<usize> {
        self.rows.iter().position(|row| &row.id == id)
    }
}

impl PresentationSink for MemorySink {
    fn insert_at(&mut self, id: &RecordId, slot: RenderedSlot, position: InsertPosition) {
        let row = SinkRow {
            id: id.clone(),
            slot,
        };
        match &position {
            InsertPosition::Before(anchor) => match self.index_of(anchor) {
                Some(index) => self.rows.insert(index, row),
                None => {
                    warn!("event=sink_insert module=view status=degraded anchor={anchor} record_id={id}");
                    self.rows.push(row);
                }
            },
            InsertPosition::End => self.rows.push(row),
        }
        self.ops.push(SinkOp::Insert {
            id: id.clone(),
            position,
        });
    }

    fn update_in_place(&mut self, id: &RecordId, slot: RenderedSlot) {
        if let Some(index) = self.index_of(id) {
            let visibility = self.rows[index].slot.visibility;
            self.rows[index].slot = RenderedSlot { visibility, ..slot };
        }
        self.ops.push(SinkOp::Update(id.clone()));
    }

    fn remove(&mut self, id: &RecordId) {
        self.rows.retain(|row| &row.id != id);
        self.ops.push(SinkOp::Remove(id.clone()));
    }

    fn reveal(&mut self, id: &RecordId) {
        if let Some(index) = self.index_of(id) {
            self.rows[index].slot.visibility = Visibility::Visible;
        }
        self.ops.push(SinkOp::Reveal(id.clone()));
    }
}
