//! Tick-driven timer queue and the deferred read marker built on it.
//!
//! Nothing here spawns threads; the owning runtime polls [`TimerQueue::fire_due`]
//! from its tick loop, which keeps firing deterministic and testable. Every
//! scheduled action fires at most once and cancellation is idempotent.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::model::{ItemId, MarkReadRequest, MarkReadSink};

type TimerAction = Box<dyn FnOnce() + Send>;

/// Handle for a scheduled action. Cancel through the queue that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerHandle(u64);

struct TimerEntry {
    id: u64,
    deadline: Instant,
    action: TimerAction,
}

/// Ordered set of pending one-shot actions.
#[derive(Default)]
pub struct TimerQueue {
    entries: Mutex<Vec<TimerEntry>>,
    next_id: AtomicU64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule_at<F>(&self, deadline: Instant, action: F) -> TimerHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut guard) = self.entries.lock() {
            guard.push(TimerEntry {
                id,
                deadline,
                action: Box::new(action),
            });
        }
        TimerHandle(id)
    }

    pub fn schedule<F>(&self, delay: Duration, action: F) -> TimerHandle
    where
        F: FnOnce() + Send + 'static,
    {
        self.schedule_at(Instant::now() + delay, action)
    }

    /// Drop a pending action. Cancelling twice, or cancelling after the
    /// action fired, has no effect.
    pub fn cancel(&self, handle: TimerHandle) {
        if let Ok(mut guard) = self.entries.lock() {
            guard.retain(|entry| entry.id != handle.0);
        }
    }

    /// Run every action whose deadline is at or before `now`. Actions are
    /// pulled out of the queue before invocation, so a firing action may
    /// schedule or cancel without deadlocking. Returns how many fired.
    pub fn fire_due(&self, now: Instant) -> usize {
        let due: Vec<TimerEntry> = {
            let mut guard = match self.entries.lock() {
                Ok(guard) => guard,
                Err(_) => return 0,
            };
            let mut due = Vec::new();
            let mut index = 0;
            while index < guard.len() {
                if guard[index].deadline <= now {
                    due.push(guard.remove(index));
                } else {
                    index += 1;
                }
            }
            due
        };

        let fired = due.len();
        for entry in due {
            (entry.action)();
        }
        fired
    }

    /// Earliest pending deadline, used by the runtime to bound its poll
    /// timeout.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.entries
            .lock()
            .ok()
            .and_then(|guard| guard.iter().map(|entry| entry.deadline).min())
    }

    pub fn pending(&self) -> usize {
        self.entries.lock().map(|guard| guard.len()).unwrap_or(0)
    }
}

/// Schedules the delayed "mark read" command after a card is activated.
///
/// The delay exists so the read-state dimming does not flash before the
/// navigation transition away from the card completes.
#[derive(Clone)]
pub struct DeferredReadMarker {
    timers: Arc<TimerQueue>,
    sink: Arc<dyn MarkReadSink>,
}

impl DeferredReadMarker {
    pub fn new(timers: Arc<TimerQueue>, sink: Arc<dyn MarkReadSink>) -> Self {
        Self { timers, sink }
    }

    pub fn timers(&self) -> &Arc<TimerQueue> {
        &self.timers
    }

    /// Schedule a local-only read mark for `item_id` after `delay`.
    pub fn schedule(&self, item_id: ItemId, delay: Duration) -> TimerHandle {
        self.schedule_with_followup(item_id, delay, || {})
    }

    /// Same as [`schedule`](Self::schedule), with an extra action run after
    /// the sink command (the card uses it to dim its own paint).
    pub fn schedule_with_followup<F>(
        &self,
        item_id: ItemId,
        delay: Duration,
        followup: F,
    ) -> TimerHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let sink = Arc::clone(&self.sink);
        self.timers.schedule(delay, move || {
            sink.mark_read(MarkReadRequest::local_read(item_id));
            followup();
        })
    }

    pub fn cancel(&self, handle: TimerHandle) {
        self.timers.cancel(handle);
    }
}
