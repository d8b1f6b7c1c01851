//! Virtual timer queue.
//!
//! Deadlines are offsets from page start. Nothing here sleeps: the host
//! passes the current time and pulls whatever has come due.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Min-ordered queue of pending tasks. Tasks sharing a deadline fire in the
/// order they were scheduled.
#[derive(Debug)]
pub struct Timers<T> {
    next_id: u64,
    queue: BTreeMap<(Duration, TimerId), T>,
    deadlines: HashMap<TimerId, Duration>,
}

impl<T> Default for Timers<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            queue: BTreeMap::new(),
            deadlines: HashMap::new(),
        }
    }
}

impl<T> Timers<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, at: Duration, task: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.queue.insert((at, id), task);
        self.deadlines.insert(id, at);
        id
    }

    /// Cancel a pending timer, returning its task if it had not fired.
    pub fn cancel(&mut self, id: TimerId) -> Option<T> {
        let at = self.deadlines.remove(&id)?;
        self.queue.remove(&(at, id))
    }

    /// Remove and return the earliest task due at or before `now`, with
    /// its deadline.
    pub fn pop_due(&mut self, now: Duration) -> Option<(Duration, T)> {
        let entry = self.queue.first_entry()?;
        if entry.key().0 > now {
            return None;
        }
        let ((at, id), task) = entry.remove_entry();
        self.deadlines.remove(&id);
        Some((at, task))
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue.keys().next().map(|(at, _)| *at)
    }

    pub fn clear(&mut self) {
        self.queue.clear();
        self.deadlines.clear();
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
