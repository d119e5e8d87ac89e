#![forbid(unsafe_code)]

//! Deadline-ordered timer queue.
//!
//! [`TimerQueue`] holds one-shot and repeating timers, each carrying a message
//! that is handed back when the timer fires. The queue never reads a clock
//! itself: callers pass `now` to [`TimerQueue::pop_due`] and loop until it
//! returns `None`.
//!
//! # Invariants
//!
//! 1. Timers fire in deadline order; equal deadlines fire in scheduling order.
//! 2. A cancelled timer never fires, even if it was already due.
//! 3. A repeating timer is re-armed at `deadline + interval` before its message
//!    is returned, so cancelling it from the handler stops it.
//! 4. Timers scheduled while draining with a deadline `<= now` fire in the same
//!    drain.

use std::collections::BTreeMap;

use ahash::AHashMap;
use web_time::Duration;

/// Handle to a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone)]
struct Entry<M> {
    handle: TimerHandle,
    interval: Option<Duration>,
    msg: M,
}

type Key = (Duration, u64);

/// Deadline-ordered set of pending timers.
#[derive(Debug, Clone)]
pub struct TimerQueue<M> {
    queue: BTreeMap<Key, Entry<M>>,
    keys: AHashMap<TimerHandle, Key>,
    next_seq: u64,
    next_handle: u64,
}

impl<M> Default for TimerQueue<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> TimerQueue<M> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            queue: BTreeMap::new(),
            keys: AHashMap::new(),
            next_seq: 0,
            next_handle: 0,
        }
    }

    fn insert(&mut self, handle: TimerHandle, deadline: Duration, entry: Entry<M>) {
        let key = (deadline, self.next_seq);
        self.next_seq += 1;
        self.queue.insert(key, entry);
        self.keys.insert(handle, key);
    }

    fn allocate(&mut self) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        handle
    }

    /// Fire `msg` once at `deadline`.
    pub fn schedule_at(&mut self, deadline: Duration, msg: M) -> TimerHandle {
        let handle = self.allocate();
        self.insert(
            handle,
            deadline,
            Entry {
                handle,
                interval: None,
                msg,
            },
        );
        handle
    }

    /// Fire `msg` once, `delay` after `now`.
    pub fn schedule_after(&mut self, now: Duration, delay: Duration, msg: M) -> TimerHandle {
        self.schedule_at(now.saturating_add(delay), msg)
    }

    /// Fire `msg` at `first`, then every `interval` until cancelled.
    ///
    /// Intervals shorter than one microsecond are raised to one microsecond.
    pub fn schedule_repeating(&mut self, first: Duration, interval: Duration, msg: M) -> TimerHandle {
        let handle = self.allocate();
        self.insert(
            handle,
            first,
            Entry {
                handle,
                interval: Some(interval.max(Duration::from_micros(1))),
                msg,
            },
        );
        handle
    }

    /// Cancel a timer. Returns `false` if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        match self.keys.remove(&handle) {
            Some(key) => self.queue.remove(&key).is_some(),
            None => false,
        }
    }

    #[must_use]
    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.keys.contains_key(&handle)
    }

    /// Deadline of a pending timer.
    #[must_use]
    pub fn deadline_of(&self, handle: TimerHandle) -> Option<Duration> {
        self.keys.get(&handle).map(|(deadline, _)| *deadline)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Earliest pending deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.queue.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Drop every pending timer; returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.queue.len();
        self.queue.clear();
        self.keys.clear();
        dropped
    }
}

impl<M: Clone> TimerQueue<M> {
    /// Remove and return the earliest timer due at or before `now`.
    pub fn pop_due(&mut self, now: Duration) -> Option<(TimerHandle, M)> {
        let (&key, _) = self.queue.iter().next().filter(|((deadline, _), _)| *deadline <= now)?;
        let entry = self.queue.remove(&key)?;
        self.keys.remove(&entry.handle);
        match entry.interval {
            Some(interval) => {
                let msg = entry.msg.clone();
                let handle = entry.handle;
                self.insert(handle, key.0.saturating_add(interval), entry);
                Some((handle, msg))
            }
            None => Some((entry.handle, entry.msg)),
        }
    }
}
