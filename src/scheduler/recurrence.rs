//! Recurrence rules for scheduled events.

use chrono::{DateTime, Duration, Utc};

/// How a fired event should be rescheduled, if at all.
#[derive(Debug, Clone, Copy)]
pub enum Recurrence {
    Once,
    Every(Duration),
}

impl Recurrence {
    /// The next due time after `fired_at`, or `None` for one-shot events.
    #[must_use]
    pub fn next_after(self, fired_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::Once => None,
            Self::Every(period) => Some(fired_at + period),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn once_does_not_reschedule() {
        assert!(Recurrence::Once.next_after(Utc::now()).is_none());
    }

    #[test]
    fn periodic_advances_by_the_period() {
        let now = Utc::now();
        let period = Duration::seconds(30);
        let next = Recurrence::Every(period).next_after(now).unwrap();
        assert_eq!(next, now + period);
    }
}
