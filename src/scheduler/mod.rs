//! Priority/due-time ordered scheduler for one-shot and recurring jobs, plus
//! an immediate FIFO queue for fire-and-forget work that shouldn't wait for
//! the next heap tick.

pub mod event;
pub mod recurrence;

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::{mpsc, Mutex, Notify, Semaphore};
use tracing::{debug, warn};

use crate::config::SchedulerConfig;
use crate::scheduler::event::ScheduledEvent;
use crate::scheduler::recurrence::Recurrence;

/// Invoked once per fired event, on a worker bounded by
/// [`SchedulerConfig::worker_concurrency`].
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: ScheduledEvent);
}

#[derive(Debug, Clone)]
struct HeapEntry {
    event: ScheduledEvent,
    seq: u64,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.sort_key() == other.sort_key()
    }
}
impl Eq for HeapEntry {}

impl HeapEntry {
    /// `(Reverse(next_due), Reverse(priority_rank), insertion_order)`: earliest
    /// due time first, then lowest `priority` value (rank 0 is most urgent)
    /// first, then insertion order as the final tie-break.
    fn sort_key(&self) -> (Reverse<DateTime<Utc>>, Reverse<i32>, u64) {
        (
            Reverse(self.event.next_due),
            Reverse(self.event.priority),
            self.seq,
        )
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

pub struct Scheduler {
    heap: Mutex<BinaryHeap<HeapEntry>>,
    notify: Notify,
    next_id: AtomicU64,
    seq: AtomicU64,
    semaphore: Arc<Semaphore>,
    immediate_tx: mpsc::UnboundedSender<ScheduledEvent>,
    immediate_rx: Mutex<Option<mpsc::UnboundedReceiver<ScheduledEvent>>>,
    config: SchedulerConfig,
}

impl Scheduler {
    #[must_use]
    pub fn new(config: SchedulerConfig) -> Arc<Self> {
        let (immediate_tx, immediate_rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            heap: Mutex::new(BinaryHeap::new()),
            notify: Notify::new(),
            next_id: AtomicU64::new(1),
            seq: AtomicU64::new(0),
            semaphore: Arc::new(Semaphore::new(config.worker_concurrency.max(1))),
            immediate_tx,
            immediate_rx: Mutex::new(Some(immediate_rx)),
            config,
        })
    }

    /// Schedule `name` to fire at `due`, optionally recurring afterward.
    pub async fn schedule_at(
        &self,
        name: impl Into<String>,
        due: DateTime<Utc>,
        priority: i32,
        recurrence: Recurrence,
    ) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let event = ScheduledEvent {
            id,
            name: name.into(),
            next_due: due,
            priority,
            recurrence,
        };
        self.push(event).await;
        id
    }

    /// Schedule `name` to fire every `period`, starting one period from now.
    pub async fn schedule_every(
        &self,
        name: impl Into<String>,
        period: Duration,
        priority: i32,
    ) -> u64 {
        self.schedule_at(name, Utc::now() + period, priority, Recurrence::Every(period))
            .await
    }

    /// Queue `name` for immediate dispatch on the next FIFO drain tick,
    /// bypassing the due-time heap entirely.
    pub fn queue_immediate(&self, name: impl Into<String>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let event = ScheduledEvent {
            id,
            name: name.into(),
            next_due: Utc::now(),
            priority: 0,
            recurrence: Recurrence::Once,
        };
        if self.immediate_tx.send(event).is_err() {
            warn!("scheduler immediate queue is closed, dropping event");
        }
    }

    async fn push(&self, event: ScheduledEvent) {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let mut heap = self.heap.lock().await;
        let wake_sooner = heap.peek().is_none_or(|top| event.next_due < top.event.next_due);
        heap.push(HeapEntry { event, seq });
        drop(heap);
        if wake_sooner {
            self.notify.notify_one();
        }
    }

    /// Run the heap ticker and immediate-queue drain loops until the process
    /// exits. Each fired event is dispatched to `handler` on a worker bounded
    /// by the configured concurrency.
    pub fn run(self: &Arc<Self>, handler: Arc<dyn EventHandler>) {
        let heap_loop = Arc::clone(self);
        let heap_handler = Arc::clone(&handler);
        tokio::spawn(async move { heap_loop.run_heap_loop(heap_handler).await });

        let immediate_loop = Arc::clone(self);
        tokio::spawn(async move { immediate_loop.run_immediate_loop(handler).await });
    }

    async fn run_heap_loop(self: Arc<Self>, handler: Arc<dyn EventHandler>) {
        loop {
            let sleep_for = {
                let heap = self.heap.lock().await;
                match heap.peek() {
                    Some(top) => {
                        let delta = top.event.next_due - Utc::now();
                        delta.to_std().unwrap_or(StdDuration::ZERO)
                    }
                    None => StdDuration::from_secs(3600),
                }
            };

            tokio::select! {
                () = tokio::time::sleep(sleep_for) => {}
                () = self.notify.notified() => continue,
            }

            let mut due = Vec::new();
            {
                let mut heap = self.heap.lock().await;
                while let Some(top) = heap.peek() {
                    if top.event.next_due > Utc::now() {
                        break;
                    }
                    due.push(heap.pop().unwrap().event);
                }
            }
            for event in due {
                if let Some(next) = event.reschedule() {
                    self.push(next).await;
                }
                self.dispatch(Arc::clone(&handler), event);
            }
        }
    }

    async fn run_immediate_loop(self: Arc<Self>, handler: Arc<dyn EventHandler>) {
        let mut rx = self
            .immediate_rx
            .lock()
            .await
            .take()
            .expect("immediate queue taken by a second run() call");
        let mut ticker = tokio::time::interval(StdDuration::from_millis(
            self.config.immediate_interval_ms.max(1),
        ));
        loop {
            ticker.tick().await;
            while let Ok(event) = rx.try_recv() {
                self.dispatch(Arc::clone(&handler), event);
            }
        }
    }

    fn dispatch(&self, handler: Arc<dyn EventHandler>, event: ScheduledEvent) {
        let semaphore = Arc::clone(&self.semaphore);
        tokio::spawn(async move {
            let Ok(permit) = semaphore.acquire_owned().await else {
                return;
            };
            debug!(event_id = event.id, name = %event.name, "dispatching scheduled event");
            handler.handle(event).await;
            drop(permit);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::time::advance;

    struct CountingHandler(Arc<AtomicUsize>);

    #[async_trait]
    impl EventHandler for CountingHandler {
        async fn handle(&self, _event: ScheduledEvent) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn immediate_queue_drains_on_next_tick() {
        let scheduler = Scheduler::new(SchedulerConfig {
            autostart: true,
            immediate_interval_ms: 10,
            worker_concurrency: 2,
        });
        let count = Arc::new(AtomicUsize::new(0));
        scheduler.run(Arc::new(CountingHandler(Arc::clone(&count))));
        scheduler.queue_immediate("ping");
        advance(StdDuration::from_millis(50)).await;
        tokio::task::yield_now().await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn both_events_due_at_the_same_instant_fire() {
        let scheduler = Scheduler::new(SchedulerConfig {
            autostart: true,
            immediate_interval_ms: 1000,
            worker_concurrency: 4,
        });
        let due = Utc::now();
        let urgent = scheduler.schedule_at("urgent", due, 0, Recurrence::Once).await;
        let routine = scheduler
            .schedule_at("routine", due, 10, Recurrence::Once)
            .await;
        assert_ne!(urgent, routine);
        let count = Arc::new(AtomicUsize::new(0));
        scheduler.run(Arc::new(CountingHandler(Arc::clone(&count))));
        advance(StdDuration::from_millis(10)).await;
        tokio::task::yield_now().await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
