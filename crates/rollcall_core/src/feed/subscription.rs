//! Long-lived subscription binding a change source to a reconciler.

use crate::clock::Clock;
use crate::feed::{ChangeSource, FeedResult};
use crate::view::reconciler::{BatchReport, LiveViewReconciler};
use crate::view::sink::PresentationSink;
use log::info;

pub struct Subscription<S> {
    source: S,
    active: bool,
    delivered_batches: u64,
}

impl<S: ChangeSource> Subscription<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            active: true,
            delivered_batches: 0,
        }
    }

    /// Polls the source once and applies the batch.
    ///
    /// Returns `Ok(None)` after `unsubscribe()`; the source is not polled.
    pub fn pump<K: PresentationSink, C: Clock>(
        &mut self,
        view: &mut LiveViewReconciler<K, C>,
    ) -> FeedResult<Option<BatchReport>> {
        if !self.active {
            return Ok(None);
        }
        let batch = self.source.poll()?;
        self.delivered_batches += 1;
        Ok(Some(view.apply_batch(batch)))
    }

    /// Stops delivery. Rows already rendered stay as they are.
    pub fn unsubscribe(&mut self) {
        if self.active {
            self.active = false;
            info!(
                "event=unsubscribe module=feed status=ok delivered_batches={}",
                self.delivered_batches
            );
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn delivered_batches(&self) -> u64 {
        self.delivered_batches
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}
