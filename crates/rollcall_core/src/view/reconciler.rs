//! Ordered live-view reconciler.
//!
//! # Responsibility
//! - Translate an ordered change stream into sink mutations that keep the
//!   rendered rows ascending by sort key.
//! - Absorb duplicate, late or unknown-identity events without failing.
//!
//! # Invariants
//! - Rows below the header are non-decreasing in the sort key they were
//!   inserted with; equal keys keep arrival order.
//! - Each event costs at most one positional scan of the rendered rows.
//! - `Modified` never moves a row, even when its timestamp changed. A row
//!   inserted with a provisional key keeps that position after the store
//!   assigns the real one.
//! - A malformed or undecodable event is rejected alone; the rest of its
//!   batch still applies.

use crate::clock::Clock;
use crate::model::change::{ChangeBatch, MalformedChange, RawChange, RecordChange};
use crate::model::record::{Record, RecordId};
use crate::view::render::render_slot;
use crate::view::sink::{InsertPosition, PresentationSink};
use log::{debug, warn};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
struct RenderedEntry {
    id: RecordId,
    /// Key used to place the row. Not updated by later modifications.
    sort_key: i64,
}

/// What a single `apply` did to the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Inserted at this index below the header.
    Inserted { index: usize },
    Updated,
    Removed,
    /// Removal of an identity that is not rendered.
    Ignored,
}

/// Result of applying one change batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub applied: usize,
    pub rejected: Vec<MalformedChange>,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Keeps a presentation sink in timestamp order as changes arrive.
///
/// The reconciler owns its sink; nothing else may mutate it while the view
/// is alive. `apply` takes `&mut self`, so nested delivery cannot happen.
pub struct LiveViewReconciler<K, C> {
    sink: K,
    clock: C,
    entries: Vec<RenderedEntry>,
    rendered: HashSet<RecordId>,
    pending_reveal: Vec<RecordId>,
}

impl<K: PresentationSink, C: Clock> LiveViewReconciler<K, C> {
    pub fn new(sink: K, clock: C) -> Self {
        Self {
            sink,
            clock,
            entries: Vec::new(),
            rendered: HashSet::new(),
            pending_reveal: Vec::new(),
        }
    }

    /// Applies one validated change.
    pub fn apply(&mut self, change: RecordChange) -> ApplyOutcome {
        match change {
            RecordChange::Inserted(record) | RecordChange::Modified(record)
                if self.rendered.contains(&record.id) =>
            {
                self.update(record)
            }
            RecordChange::Inserted(record) | RecordChange::Modified(record) => {
                self.insert(record)
            }
            RecordChange::Removed(id) => self.remove(&id),
        }
    }

    /// Validates and applies one raw event.
    pub fn apply_raw(&mut self, raw: RawChange) -> Result<ApplyOutcome, MalformedChange> {
        let change = RecordChange::try_from(raw)?;
        Ok(self.apply(change))
    }

    /// Applies a batch in delivery order, isolating malformed events.
    pub fn apply_batch(&mut self, batch: ChangeBatch) -> BatchReport {
        let mut report = BatchReport::default();
        for err in batch.undecodable {
            warn!("event=change_rejected module=view status=error reason={err}");
            report.rejected.push(err);
        }
        for raw in batch.changes {
            match self.apply_raw(raw) {
                Ok(_) => report.applied += 1,
                Err(err) => {
                    warn!("event=change_rejected module=view status=error reason={err}");
                    report.rejected.push(err);
                }
            }
        }
        debug!(
            "event=view_apply module=view status=ok applied={} rejected={} rows={}",
            report.applied,
            report.rejected.len(),
            self.entries.len()
        );
        report
    }

    /// Reveals every slot inserted since the previous tick.
    ///
    /// Returns how many slots became visible.
    pub fn tick(&mut self) -> usize {
        let pending = std::mem::take(&mut self.pending_reveal);
        for id in &pending {
            self.sink.reveal(id);
        }
        pending.len()
    }

    /// Removes every rendered row, leaving the header alone.
    pub fn teardown(&mut self) {
        for entry in self.entries.drain(..) {
            self.sink.remove(&entry.id);
        }
        self.rendered.clear();
        self.pending_reveal.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.rendered.contains(id)
    }

    /// Rendered identities, top to bottom.
    pub fn rendered_ids(&self) -> impl Iterator<Item = &RecordId> {
        self.entries.iter().map(|entry| &entry.id)
    }

    /// Placement keys, top to bottom.
    pub fn placement_keys(&self) -> impl Iterator<Item = i64> + '_ {
        self.entries.iter().map(|entry| entry.sort_key)
    }

    pub fn pending_reveals(&self) -> usize {
        self.pending_reveal.len()
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn into_sink(self) -> K {
        self.sink
    }

    fn insert(&mut self, record: Record) -> ApplyOutcome {
        let now_ms = self.clock.now_ms();
        let sort_key = record.sort_key.unwrap_or(now_ms);
        let slot = render_slot(&record, sort_key, now_ms);

        let (index, position) = match self
            .entries
            .iter()
            .position(|entry| entry.sort_key > sort_key)
        {
            Some(index) => (
                index,
                InsertPosition::Before(self.entries[index].id.clone()),
            ),
            None => (self.entries.len(), InsertPosition::End),
        };

        self.sink.insert_at(&record.id, slot, position);
        self.entries.insert(
            index,
            RenderedEntry {
                id: record.id.clone(),
                sort_key,
            },
        );
        self.rendered.insert(record.id.clone());
        self.pending_reveal.push(record.id);

        ApplyOutcome::Inserted { index }
    }

    fn update(&mut self, record: Record) -> ApplyOutcome {
        let placed_key = self
            .entries
            .iter()
            .find(|entry| entry.id == record.id)
            .map(|entry| entry.sort_key);
        let Some(placed_key) = placed_key else {
            return self.insert(record);
        };

        let now_ms = self.clock.now_ms();
        let shown_key = record.sort_key.unwrap_or(placed_key);
        let slot = render_slot(&record, shown_key, now_ms);
        self.sink.update_in_place(&record.id, slot);
        ApplyOutcome::Updated
    }

    fn remove(&mut self, id: &RecordId) -> ApplyOutcome {
        if !self.rendered.remove(id) {
            return ApplyOutcome::Ignored;
        }
        if let Some(index) = self.entries.iter().position(|entry| &entry.id == id) {
            self.entries.remove(index);
        }
        self.pending_reveal.retain(|pending| pending != id);
        self.sink.remove(id);
        ApplyOutcome::Removed
    }
}
