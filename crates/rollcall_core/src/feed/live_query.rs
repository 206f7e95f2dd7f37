//! Live ordered query over the attendance collection.
//!
//! Each poll re-reads the ordered query and diffs it against the snapshot
//! delivered last time. Removals come first in their old order, then
//! insertions and modifications in their new order.

use crate::feed::{ChangeSource, FeedResult};
use crate::model::change::{ChangeBatch, RawChange};
use crate::model::record::{Record, RecordId};
use crate::repo::attendance_repo::AttendanceRepository;
use log::{debug, error};
use std::collections::HashMap;
use std::time::Instant;

pub struct LiveQuery<R> {
    repo: R,
    limit: Option<u32>,
    delivered: Vec<Record>,
}

impl<R: AttendanceRepository> LiveQuery<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            limit: None,
            delivered: Vec::new(),
        }
    }

    /// Restricts the query to the first `limit` rows in order.
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Records delivered so far, in query order.
    pub fn snapshot(&self) -> &[Record] {
        &self.delivered
    }
}

impl<R: AttendanceRepository> ChangeSource for LiveQuery<R> {
    fn poll(&mut self) -> FeedResult<ChangeBatch> {
        let started_at = Instant::now();
        let current = match self.repo.list_ordered(self.limit) {
            Ok(records) => records,
            Err(err) => {
                error!("event=live_query_poll module=feed status=error error={err}");
                return Err(err.into());
            }
        };

        let batch = diff_snapshots(&self.delivered, &current);
        self.delivered = current;

        debug!(
            "event=live_query_poll module=feed status=ok changes={} rows={} duration_ms={}",
            batch.len(),
            self.delivered.len(),
            started_at.elapsed().as_millis()
        );
        Ok(batch)
    }
}

fn diff_snapshots(previous: &[Record], current: &[Record]) -> ChangeBatch {
    let before: HashMap<&RecordId, &Record> =
        previous.iter().map(|record| (&record.id, record)).collect();
    let after: HashMap<&RecordId, &Record> =
        current.iter().map(|record| (&record.id, record)).collect();

    let removed = previous
        .iter()
        .filter(|record| !after.contains_key(&record.id))
        .map(|record| RawChange::removed(&record.id));

    let upserted = current
        .iter()
        .filter_map(|record| match before.get(&record.id) {
            None => Some(RawChange::inserted(record)),
            Some(old) if *old != record => Some(RawChange::modified(record)),
            Some(_) => None,
        });

    removed.chain(upserted).collect()
}

#[cfg(test)]
mod tests {
    use super::diff_snapshots;
    use crate::model::change::ChangeKind;
    use crate::model::record::{DisplayFields, Record, RecordId};

    fn record(id: &str, key: i64, subject: &str) -> Record {
        Record::with_id(
            RecordId::new(id).unwrap(),
            DisplayFields::attendance(id, subject, "1"),
        )
        .stamped(key)
    }

    #[test]
    fn removals_precede_upserts() {
        let previous = vec![record("a", 1, "Maths"), record("b", 2, "Maths")];
        let current = vec![record("b", 2, "Python"), record("c", 3, "Maths")];

        let batch = diff_snapshots(&previous, &current);
        let summary: Vec<_> = batch
            .changes
            .iter()
            .map(|change| (change.kind, change.identity.clone().unwrap()))
            .collect();
        assert_eq!(
            summary,
            [
                (ChangeKind::Removed, "a".to_string()),
                (ChangeKind::Modified, "b".to_string()),
                (ChangeKind::Inserted, "c".to_string()),
            ]
        );
    }

    #[test]
    fn unchanged_snapshot_yields_empty_batch() {
        let snapshot = vec![record("a", 1, "Maths")];
        assert!(diff_snapshots(&snapshot, &snapshot).is_empty());
    }
}
