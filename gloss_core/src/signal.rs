// Copyright 2026 the Gloss Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Typed callback registries.
//!
//! A [`Signal<T>`] owns a list of boxed callbacks. Subscribing returns a
//! [`SubscriptionId`] that the subscriber keeps and can later hand back to
//! [`Signal::unsubscribe`]. Emission calls every live callback in
//! subscription order with a shared reference to the payload.
//!
//! Signals are owned by the component that raises them (the compositor, the
//! full-screen slot, the frame scheduler); there is no global bus.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

/// A revocable handle returned by [`Signal::subscribe`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl fmt::Debug for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubscriptionId({})", self.0)
    }
}

type Callback<T> = Box<dyn FnMut(&T)>;

/// A typed subscription registry.
pub struct Signal<T> {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Callback<T>)>,
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("subscribers", &self.subscribers.len())
            .finish_non_exhaustive()
    }
}

impl<T> Signal<T> {
    /// Creates a signal with no subscribers.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next_id: 0,
            subscribers: Vec::new(),
        }
    }

    /// Registers `callback` and returns the handle that revokes it.
    pub fn subscribe(&mut self, callback: impl FnMut(&T) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Removes a subscription. Returns `false` if it was already revoked.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    /// Calls every subscriber with `value`, in subscription order.
    pub fn emit(&mut self, value: &T) {
        for (_, callback) in &mut self.subscribers {
            callback(value);
        }
    }

    /// Returns the number of live subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// Returns `true` if nobody is subscribed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use core::cell::RefCell;

    #[test]
    fn emits_in_subscription_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut signal = Signal::<u32>::new();

        let l = Rc::clone(&log);
        signal.subscribe(move |v| l.borrow_mut().push(("a", *v)));
        let l = Rc::clone(&log);
        signal.subscribe(move |v| l.borrow_mut().push(("b", *v)));

        signal.emit(&7);
        assert_eq!(*log.borrow(), [("a", 7), ("b", 7)], "both subscribers in order");
    }

    #[test]
    fn revoked_subscribers_stop_receiving() {
        let hits = Rc::new(RefCell::new(0_u32));
        let mut signal = Signal::<()>::new();

        let h = Rc::clone(&hits);
        let id = signal.subscribe(move |()| *h.borrow_mut() += 1);
        signal.emit(&());
        assert!(signal.unsubscribe(id), "first revoke succeeds");
        assert!(!signal.unsubscribe(id), "second revoke is a no-op");
        signal.emit(&());

        assert_eq!(*hits.borrow(), 1, "only the emission before revoking counts");
        assert!(signal.is_empty());
    }

    #[test]
    fn ids_are_not_reused() {
        let mut signal = Signal::<()>::new();
        let a = signal.subscribe(|()| {});
        signal.unsubscribe(a);
        let b = signal.subscribe(|()| {});
        assert_ne!(a, b, "fresh id after revoke");
        assert_eq!(signal.len(), 1);
    }
}
