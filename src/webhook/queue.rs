//! Bounded hand-off between the webhook handler and the sync consumer.

use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError, Receiver, Sender};
use tracing::{info, warn};

use super::payload::PushEvent;
use crate::engine::SyncEngine;
use crate::model::SyncStatus;

/// Why an event could not be queued.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnqueueError {
    /// Every slot is taken.
    #[error("event queue is full")]
    Full,
    /// The consumer has stopped.
    #[error("event queue is closed")]
    Closed,
}

/// Producer side of the event queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct EventQueue {
    tx: Sender<PushEvent>,
}

impl EventQueue {
    /// Creates a queue holding at most `capacity` pending events.
    #[must_use]
    pub fn bounded(capacity: usize) -> (Self, Receiver<PushEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    /// Queues `event` without waiting.
    ///
    /// # Errors
    ///
    /// Returns [`EnqueueError::Full`] when no slot is free and
    /// [`EnqueueError::Closed`] when the consumer is gone.
    pub fn try_enqueue(&self, event: PushEvent) -> Result<(), EnqueueError> {
        self.tx.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) => EnqueueError::Full,
            TrySendError::Closed(_) => EnqueueError::Closed,
        })
    }

    /// Number of events waiting for the consumer.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    /// Maximum number of pending events.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }
}

/// Processes queued events one at a time until every producer is dropped.
///
/// Returns the number of events processed.
pub async fn run_consumer(engine: &SyncEngine<'_>, mut rx: Receiver<PushEvent>) -> usize {
    let mut processed = 0;
    while let Some(event) = rx.recv().await {
        let report = engine.process_push(&event).await;
        processed += 1;
        if report.count(SyncStatus::Failed) > 0 {
            warn!(
                run_id = %report.run_id,
                failed = report.count(SyncStatus::Failed),
                "push processed with failures"
            );
        }
    }
    info!(processed, "event queue drained");
    processed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event() -> PushEvent {
        serde_json::from_value(serde_json::json!({"object_kind": "push", "commits": []})).unwrap()
    }

    #[test]
    fn full_queue_rejects_without_blocking() {
        let (queue, _rx) = EventQueue::bounded(2);
        queue.try_enqueue(event()).unwrap();
        queue.try_enqueue(event()).unwrap();
        assert_eq!(queue.try_enqueue(event()), Err(EnqueueError::Full));
        assert_eq!(queue.depth(), 2);
    }

    #[tokio::test]
    async fn depth_drops_as_events_are_received() {
        let (queue, mut rx) = EventQueue::bounded(4);
        queue.try_enqueue(event()).unwrap();
        assert_eq!(queue.depth(), 1);
        rx.recv().await.unwrap();
        assert_eq!(queue.depth(), 0);
        assert_eq!(queue.capacity(), 4);
    }

    #[test]
    fn dropped_consumer_closes_queue() {
        let (queue, rx) = EventQueue::bounded(1);
        drop(rx);
        assert_eq!(queue.try_enqueue(event()), Err(EnqueueError::Closed));
    }
}
