use std::collections::BTreeMap;

use crate::clock::Millis;

/// Handle to a pending timer. Ordering is (due time, registration order),
/// which is also the dispatch order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId {
    due: Millis,
    seq: u64,
}

impl TimerId {
    pub fn due(&self) -> Millis {
        self.due
    }
}

/// Cancellable queue of timed events owned by one session.
///
/// The scheduler never runs anything itself: the owner pops due events and
/// dispatches them, so a cancelled timer simply never comes out of the queue.
#[derive(Debug)]
pub struct Scheduler<E> {
    pending: BTreeMap<TimerId, E>,
    next_seq: u64,
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Scheduler<E> {
    pub fn new() -> Self {
        Self {
            pending: BTreeMap::new(),
            next_seq: 0,
        }
    }

    pub fn schedule_at(&mut self, due: Millis, event: E) -> TimerId {
        let id = TimerId {
            due,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.pending.insert(id, event);
        id
    }

    pub fn schedule_after(&mut self, now: Millis, delay_ms: Millis, event: E) -> TimerId {
        self.schedule_at(now.saturating_add(delay_ms), event)
    }

    /// Returns the event if it was still pending.
    pub fn cancel(&mut self, id: TimerId) -> Option<E> {
        self.pending.remove(&id)
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    /// Removes and returns the earliest event due at or before `now`.
    pub fn pop_due(&mut self, now: Millis) -> Option<(Millis, E)> {
        let first = *self.pending.keys().next()?;
        if first.due > now {
            return None;
        }
        self.pending.remove(&first).map(|event| (first.due, event))
    }

    pub fn next_due(&self) -> Option<Millis> {
        self.pending.keys().next().map(|id| id.due)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_due_order() {
        let mut timers = Scheduler::new();
        timers.schedule_at(300, "c");
        timers.schedule_at(100, "a");
        timers.schedule_at(200, "b");

        assert_eq!(timers.pop_due(1_000), Some((100, "a")));
        assert_eq!(timers.pop_due(1_000), Some((200, "b")));
        assert_eq!(timers.pop_due(1_000), Some((300, "c")));
        assert_eq!(timers.pop_due(1_000), None);
    }

    #[test]
    fn equal_due_times_are_fifo() {
        let mut timers = Scheduler::new();
        timers.schedule_at(500, 1);
        timers.schedule_at(500, 2);
        timers.schedule_at(500, 3);

        let order: Vec<_> = std::iter::from_fn(|| timers.pop_due(500))
            .map(|(_, e)| e)
            .collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn nothing_pops_before_due() {
        let mut timers = Scheduler::new();
        timers.schedule_after(1_000, 500, ());

        assert_eq!(timers.next_due(), Some(1_500));
        assert!(timers.pop_due(1_499).is_none());
        assert!(timers.pop_due(1_500).is_some());
        assert!(timers.is_empty());
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut timers = Scheduler::new();
        let keep = timers.schedule_at(10, "keep");
        let drop = timers.schedule_at(5, "drop");

        assert_eq!(timers.cancel(drop), Some("drop"));
        assert_eq!(timers.cancel(drop), None);
        assert_eq!(timers.len(), 1);
        assert_eq!(timers.pop_due(100), Some((keep.due(), "keep")));
    }

    #[test]
    fn cancel_all_clears_queue() {
        let mut timers = Scheduler::new();
        timers.schedule_at(1, ());
        timers.schedule_at(2, ());
        timers.cancel_all();

        assert!(timers.is_empty());
        assert_eq!(timers.next_due(), None);
    }
}
