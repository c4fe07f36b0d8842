//! Synchronous change notification.
//!
//! [`Notifier`] is the observer primitive shared by the parameter store,
//! the color sampler, and the session connection. Listeners run in
//! subscription order, synchronously, on the caller's stack. Everything
//! runs on one event loop, so listeners are plain `FnMut` closures with
//! no `Send` bound.

use std::fmt;

/// Handle returned by [`Notifier::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener<E> = Box<dyn FnMut(&E)>;

/// An ordered list of listeners for events of type `E`.
pub struct Notifier<E: ?Sized> {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener<E>)>,
}

impl<E: ?Sized> Notifier<E> {
    /// Create a notifier with no listeners.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next_id: 0,
            listeners: Vec::new(),
        }
    }

    /// Register a listener. It is called once per [`emit`](Self::emit)
    /// until it is unsubscribed.
    pub fn subscribe(&mut self, listener: impl FnMut(&E) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    /// Deliver `event` to every listener, in subscription order.
    pub fn emit(&mut self, event: &E) {
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }

    /// Number of registered listeners.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Returns `true` if nobody is listening.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl<E: ?Sized> Default for Notifier<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ?Sized> fmt::Debug for Notifier<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn emits_to_listeners_in_subscription_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut notifier = Notifier::<u32>::new();

        let first = Rc::clone(&seen);
        notifier.subscribe(move |v| first.borrow_mut().push(("first", *v)));
        let second = Rc::clone(&seen);
        notifier.subscribe(move |v| second.borrow_mut().push(("second", *v)));

        notifier.emit(&7);
        assert_eq!(*seen.borrow(), vec![("first", 7), ("second", 7)]);
    }

    #[test]
    fn unsubscribed_listener_is_not_called() {
        let count = Rc::new(RefCell::new(0));
        let mut notifier = Notifier::<()>::new();

        let counter = Rc::clone(&count);
        let id = notifier.subscribe(move |_| *counter.borrow_mut() += 1);
        notifier.emit(&());
        assert!(notifier.unsubscribe(id));
        notifier.emit(&());

        assert_eq!(*count.borrow(), 1);
        assert!(notifier.is_empty());
    }

    #[test]
    fn unsubscribing_twice_reports_false() {
        let mut notifier = Notifier::<()>::new();
        let id = notifier.subscribe(|_| {});
        assert!(notifier.unsubscribe(id));
        assert!(!notifier.unsubscribe(id));
    }

    #[test]
    fn unsized_events_are_supported() {
        let total = Rc::new(RefCell::new(0usize));
        let mut notifier = Notifier::<[u8]>::new();
        let sink = Rc::clone(&total);
        notifier.subscribe(move |bytes: &[u8]| *sink.borrow_mut() += bytes.len());

        notifier.emit(&[1, 2, 3][..]);
        notifier.emit(&[4][..]);
        assert_eq!(*total.borrow(), 4);
    }
}
