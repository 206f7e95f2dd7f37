//! Change source that replays pre-recorded batches.

use crate::feed::{ChangeSource, FeedResult};
use crate::model::change::ChangeBatch;
use std::collections::VecDeque;

/// Replays batches in order, then keeps returning empty batches.
#[derive(Debug, Clone, Default)]
pub struct ScriptedChangeSource {
    batches: VecDeque<ChangeBatch>,
}

impl ScriptedChangeSource {
    pub fn new(batches: impl IntoIterator<Item = ChangeBatch>) -> Self {
        Self {
            batches: batches.into_iter().collect(),
        }
    }

    /// Decodes a JSON array of batches, each an array of wire events.
    ///
    /// Only the outer shape can fail; a corrupt event is kept as an
    /// undecodable entry of its batch.
    pub fn from_json_str(json: &str) -> FeedResult<Self> {
        let batches: Vec<ChangeBatch> = serde_json::from_str(json)?;
        Ok(Self::new(batches))
    }

    pub fn push(&mut self, batch: ChangeBatch) {
        self.batches.push_back(batch);
    }

    pub fn remaining(&self) -> usize {
        self.batches.len()
    }
}

impl ChangeSource for ScriptedChangeSource {
    fn poll(&mut self) -> FeedResult<ChangeBatch> {
        Ok(self.batches.pop_front().unwrap_or_default())
    }
}
