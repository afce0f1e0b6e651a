//! Event bus: non-blocking publish, bounded worker pool on the consuming side.
//!
//! `publish()` runs on the request path and must never wait: it uses
//! `try_send`, and a full or closed channel drops the event (counted and
//! logged). The `EventWorker` drains the channel and dispatches each event on
//! its own task, at most `concurrency` at a time. Failed events are logged and
//! counted, never retried.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, watch, Semaphore};
use tokio::task::JoinSet;

use super::events::WorkflowActionEvent;
use super::listener::WorkflowEventDispatcher;

// ---------------------------------------------------------------------------
// Publisher
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusStats {
    pub published: u64,
    pub dropped: u64,
}

#[derive(Default)]
struct Counters {
    published: AtomicU64,
    dropped: AtomicU64,
}

/// Cloneable publishing handle.
#[derive(Clone)]
pub struct WorkflowEventBus {
    sender: mpsc::Sender<WorkflowActionEvent>,
    counters: Arc<Counters>,
}

/// Consuming end, owned by the `EventWorker`.
pub struct EventReceiver {
    receiver: mpsc::Receiver<WorkflowActionEvent>,
}

impl WorkflowEventBus {
    /// Create a bus with room for `capacity` undelivered events.
    pub fn new(capacity: usize) -> (Self, EventReceiver) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (
            Self {
                sender,
                counters: Arc::new(Counters::default()),
            },
            EventReceiver { receiver },
        )
    }

    /// Hand an event to the worker pool. Never blocks.
    pub fn publish(&self, event: WorkflowActionEvent) {
        match self.sender.try_send(event) {
            Ok(()) => {
                self.counters.published.fetch_add(1, Ordering::Relaxed);
            }
            Err(mpsc::error::TrySendError::Full(event)) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    event_id = %event.event_id,
                    phase = event.phase.as_str(),
                    key = %event.dto.key,
                    reference = %event.dto.reference,
                    "Workflow event buffer full, dropping event"
                );
            }
            Err(mpsc::error::TrySendError::Closed(event)) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    event_id = %event.event_id,
                    phase = event.phase.as_str(),
                    "Workflow event worker gone, dropping event"
                );
            }
        }
    }

    pub fn stats(&self) -> BusStats {
        BusStats {
            published: self.counters.published.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
        }
    }
}

// ---------------------------------------------------------------------------
// EventWorker
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub processed: u64,
    pub failed: u64,
    /// Still queued when shutdown was signalled; never dispatched.
    pub dropped: u64,
}

pub struct EventWorker {
    dispatcher: WorkflowEventDispatcher,
    receiver: EventReceiver,
    permits: Arc<Semaphore>,
}

impl EventWorker {
    pub fn new(
        dispatcher: WorkflowEventDispatcher,
        receiver: EventReceiver,
        concurrency: usize,
    ) -> Self {
        Self {
            dispatcher,
            receiver,
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
        }
    }

    /// Run until every publisher is dropped or shutdown is signalled, then
    /// wait for in-flight events and return the totals. Events still queued
    /// after a shutdown are counted as dropped, one warning each.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> WorkerStats {
        tracing::info!(
            concurrency = self.permits.available_permits(),
            "Workflow event worker started"
        );

        let mut stats = WorkerStats::default();
        let mut in_flight: JoinSet<bool> = JoinSet::new();
        let mut shutdown_open = true;

        loop {
            if *shutdown.borrow() {
                tracing::info!("Workflow event worker shutting down");
                break;
            }

            tokio::select! {
                maybe_event = self.receiver.receiver.recv() => {
                    let Some(event) = maybe_event else {
                        tracing::debug!("Workflow event channel closed");
                        break;
                    };
                    let permit = match Arc::clone(&self.permits).acquire_owned().await {
                        Ok(permit) => permit,
                        Err(_) => break,
                    };
                    let dispatcher = self.dispatcher.clone();
                    in_flight.spawn(async move {
                        let ok = handle_event(&dispatcher, &event).await;
                        drop(permit);
                        ok
                    });
                }
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    tally(&mut stats, joined);
                }
                changed = shutdown.changed(), if shutdown_open => {
                    // Sender dropped: no signal can arrive any more.
                    shutdown_open = changed.is_ok();
                }
            }
        }

        self.receiver.receiver.close();
        while let Ok(event) = self.receiver.receiver.try_recv() {
            stats.dropped += 1;
            tracing::warn!(
                event_id = %event.event_id,
                phase = event.phase.as_str(),
                key = %event.dto.key,
                reference = %event.dto.reference,
                "Workflow event still queued at shutdown, dropping event"
            );
        }

        while let Some(joined) = in_flight.join_next().await {
            tally(&mut stats, joined);
        }

        tracing::info!(
            processed = stats.processed,
            failed = stats.failed,
            dropped = stats.dropped,
            "Workflow event worker stopped"
        );
        stats
    }
}

async fn handle_event(dispatcher: &WorkflowEventDispatcher, event: &WorkflowActionEvent) -> bool {
    match dispatcher.dispatch(event).await {
        Ok(outcome) => {
            tracing::trace!(event_id = %event.event_id, ?outcome, "Workflow event handled");
            true
        }
        Err(e) => {
            tracing::error!(
                event_id = %event.event_id,
                phase = event.phase.as_str(),
                key = %event.dto.key,
                reference = %event.dto.reference,
                error = %e,
                "Workflow event handling failed, event dropped"
            );
            false
        }
    }
}

fn tally(stats: &mut WorkerStats, joined: Result<bool, tokio::task::JoinError>) {
    match joined {
        Ok(true) => stats.processed += 1,
        Ok(false) => stats.failed += 1,
        Err(e) => {
            // A panicking hook only takes down its own task.
            tracing::error!(error = %e, "Workflow event task panicked");
            stats.failed += 1;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
