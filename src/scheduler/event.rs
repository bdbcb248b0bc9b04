//! Scheduled event records and recurrence rules.

use chrono::{DateTime, Utc};

use crate::scheduler::recurrence::Recurrence;

/// A pending scheduled job.
#[derive(Debug, Clone)]
pub struct ScheduledEvent {
    pub id: u64,
    pub name: String,
    pub next_due: DateTime<Utc>,
    /// Tie-break rank for events due at the same instant: lower fires first,
    /// 0 is the most urgent.
    pub priority: i32,
    pub recurrence: Recurrence,
}

impl ScheduledEvent {
    /// Compute this event's replacement after firing, or `None` if it was
    /// one-shot and should be dropped from the heap.
    #[must_use]
    pub fn reschedule(&self) -> Option<Self> {
        let next_due = self.recurrence.next_after(self.next_due)?;
        Some(Self {
            id: self.id,
            name: self.name.clone(),
            next_due,
            priority: self.priority,
            recurrence: self.recurrence,
        })
    }
}
