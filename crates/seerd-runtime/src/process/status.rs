//! Shared status cell for one supervised process.
//!
//! The record is held in a `watch` channel so that readers take a snapshot
//! without touching the per-process command lock. Transitions are applied
//! and published inside the channel's write lock, so the order subscribers
//! see matches the order the record went through.

use std::sync::Arc;

use seerd_core::{ProcessRecord, ProcessState};
use tokio::sync::watch;

use super::broadcaster::StatusBroadcaster;

#[derive(Debug)]
pub struct StatusCell {
    record: watch::Sender<ProcessRecord>,
    events: Arc<StatusBroadcaster>,
}

impl StatusCell {
    pub fn new(record: ProcessRecord, events: Arc<StatusBroadcaster>) -> Self {
        Self {
            record: watch::Sender::new(record),
            events,
        }
    }

    /// Clone of the current record.
    pub fn snapshot(&self) -> ProcessRecord {
        self.record.borrow().clone()
    }

    pub fn state(&self) -> ProcessState {
        self.record.borrow().state
    }

    /// Receiver that observes every mutation, including resource samples.
    pub fn watch(&self) -> watch::Receiver<ProcessRecord> {
        self.record.subscribe()
    }

    /// Apply a transition unconditionally and publish it.
    pub fn transition(&self, apply: impl FnOnce(&mut ProcessRecord)) -> ProcessRecord {
        let mut published = None;
        self.record.send_modify(|record| {
            apply(record);
            self.events.publish(record.clone());
            published = Some(record.clone());
        });
        published.unwrap_or_else(|| self.snapshot())
    }

    /// Apply a transition only if `guard` accepts the current record.
    ///
    /// The check and the mutation happen under one lock; this is what lets
    /// the monitor and a deliberate stop race without both winning.
    pub fn transition_if(
        &self,
        guard: impl FnOnce(&ProcessRecord) -> bool,
        apply: impl FnOnce(&mut ProcessRecord),
    ) -> Option<ProcessRecord> {
        let mut published = None;
        self.record.send_if_modified(|record| {
            if !guard(record) {
                return false;
            }
            apply(record);
            self.events.publish(record.clone());
            published = Some(record.clone());
            true
        });
        published
    }

    /// Store a resource sample. Samples are not transitions and are not published.
    pub fn record_usage(&self, cpu_time_ms: u64, memory_bytes: u64) {
        self.record
            .send_modify(|record| record.record_usage(cpu_time_ms, memory_bytes));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seerd_core::ProcessSpec;

    fn cell() -> (StatusCell, Arc<StatusBroadcaster>) {
        let events = Arc::new(StatusBroadcaster::new());
        let record = ProcessRecord::new(&ProcessSpec::new("svc", "/bin/true"));
        (StatusCell::new(record, Arc::clone(&events)), events)
    }

    #[tokio::test]
    async fn test_transition_publishes() {
        let (cell, events) = cell();
        let mut rx = events.subscribe();

        cell.transition(|r| r.mark_stopping());

        assert_eq!(rx.recv().await.unwrap().state, ProcessState::Stopping);
        assert_eq!(cell.state(), ProcessState::Stopping);
    }

    #[tokio::test]
    async fn test_rejected_guard_does_not_publish() {
        let (cell, events) = cell();
        let mut rx = events.subscribe();

        let applied = cell.transition_if(|r| r.state == ProcessState::Running, |r| {
            r.mark_failed(Some(1));
        });

        assert!(applied.is_none());
        assert_eq!(cell.state(), ProcessState::Starting);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_usage_is_not_published() {
        let (cell, events) = cell();
        let mut rx = events.subscribe();

        cell.record_usage(10, 20);

        assert_eq!(cell.snapshot().memory_bytes, 20);
        assert!(rx.try_recv().is_err());
    }
}
