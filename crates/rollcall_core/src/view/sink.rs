//! Presentation sink contract.
//!
//! A sink is the rendering surface: an ordered list of slots addressable by
//! record identity, below one fixed header slot the reconciler never touches.

use crate::model::record::RecordId;
use crate::view::render::RenderedSlot;

/// Where a new slot goes relative to the existing ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertPosition {
    Before(RecordId),
    End,
}

/// Outbound operations the reconciler performs on the rendering surface.
///
/// Implementations must tolerate a `Before` anchor they do not know by
/// appending instead.
pub trait PresentationSink {
    fn insert_at(&mut self, id: &RecordId, slot: RenderedSlot, position: InsertPosition);
    fn update_in_place(&mut self, id: &RecordId, slot: RenderedSlot);
    fn remove(&mut self, id: &RecordId);
    /// Moves a slot from pending to visible.
    fn reveal(&mut self, id: &RecordId);
}

impl<S: PresentationSink + ?Sized> PresentationSink for &mut S {
    fn insert_at(&mut self, id: &RecordId, slot: RenderedSlot, position: InsertPosition) {
        (**self).insert_at(id, slot, position);
    }

    fn update_in_place(&mut self, id: &RecordId, slot: RenderedSlot) {
        (**self).update_in_place(id, slot);
    }

    fn remove(&mut self, id: &RecordId) {
        (**self).remove(id);
    }

    fn reveal(&mut self, id: &RecordId) {
        (**self).reveal(id);
    }
}
