#![forbid(unsafe_code)]

//! Event subscriptions mapped to messages.
//!
//! A subscription pairs a predicate over events with a handler that turns a
//! matching event into an optional message. [`Subscriptions::dispatch`] runs
//! every live subscription in registration order and collects the produced
//! messages; the owner then applies them to its own state. Handlers never
//! receive mutable state, which keeps dispatch free of re-entrancy.
//!
//! # Invariants
//!
//! 1. Handlers run in registration order.
//! 2. An unsubscribed handler never runs again.
//! 3. Handles are never reused.

use std::fmt;

type Predicate<E> = Box<dyn Fn(&E) -> bool>;
type Handler<E, M> = Box<dyn Fn(&E) -> Option<M>>;

/// Handle returned by [`Subscriptions::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(u64);

struct Entry<E, M> {
    handle: SubscriptionHandle,
    predicate: Predicate<E>,
    handler: Handler<E, M>,
}

/// Ordered registry of event subscriptions.
pub struct Subscriptions<E, M> {
    entries: Vec<Entry<E, M>>,
    next: u64,
}

impl<E, M> fmt::Debug for Subscriptions<E, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriptions")
            .field("len", &self.entries.len())
            .finish()
    }
}

impl<E, M> Default for Subscriptions<E, M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E, M> Subscriptions<E, M> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next: 0,
        }
    }

    /// Register a handler for events accepted by `predicate`.
    pub fn subscribe(
        &mut self,
        predicate: impl Fn(&E) -> bool + 'static,
        handler: impl Fn(&E) -> Option<M> + 'static,
    ) -> SubscriptionHandle {
        let handle = SubscriptionHandle(self.next);
        self.next += 1;
        self.entries.push(Entry {
            handle,
            predicate: Box::new(predicate),
            handler: Box::new(handler),
        });
        handle
    }

    /// Remove a subscription; `false` if it was already gone.
    pub fn unsubscribe(&mut self, handle: SubscriptionHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.handle != handle);
        self.entries.len() != before
    }

    /// Run matching handlers and collect their messages.
    pub fn dispatch(&self, event: &E) -> Vec<M> {
        self.entries
            .iter()
            .filter(|entry| (entry.predicate)(event))
            .filter_map(|entry| (entry.handler)(event))
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every subscription; returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        removed
    }
}
