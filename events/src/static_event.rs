use std::sync::{PoisonError, RwLock};

use tracing::debug;

use crate::callback::{Callback, IntoCallback};

/// An event whose subscribers stay subscribed forever.
///
/// There are no handles and no unsubscribe, so subscribers live in an append-only list.
pub struct StaticEvent<A> {
    subscribers: RwLock<Vec<Callback<A>>>,
}

impl<A> Default for StaticEvent<A> {
    fn default() -> Self { Self::new() }
}

impl<A> Clone for StaticEvent<A> {
    fn clone(&self) -> Self { Self { subscribers: RwLock::new(self.snapshot()) } }
}

impl<A> FromIterator<Callback<A>> for StaticEvent<A> {
    fn from_iter<I: IntoIterator<Item = Callback<A>>>(iter: I) -> Self { Self { subscribers: RwLock::new(iter.into_iter().collect()) } }
}

impl<A> std::fmt::Debug for StaticEvent<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { f.debug_struct("StaticEvent").field("subscribers", &self.count()).finish() }
}

impl<A> StaticEvent<A> {
    pub fn new() -> Self { Self { subscribers: RwLock::new(Vec::new()) } }

    fn snapshot(&self) -> Vec<Callback<A>> { self.subscribers.read().unwrap_or_else(PoisonError::into_inner).clone() }

    /// Subscribe forever. An empty callback is ignored.
    pub fn subscribe<C>(&self, callback: C)
    where C: IntoCallback<A> {
        if let Some(callback) = callback.into_callback() {
            self.subscribers.write().unwrap_or_else(PoisonError::into_inner).push(callback);
        }
    }

    /// Invoke every subscriber in subscription order. A panicking subscriber aborts the rest.
    pub fn dispatch(&self, args: &A) {
        for callback in self.snapshot() {
            callback(args);
        }
    }

    pub fn count(&self) -> usize { self.subscribers.read().unwrap_or_else(PoisonError::into_inner).len() }

    /// Remove every subscriber. **Intended for tests only.**
    pub fn clear(&self) {
        let removed = std::mem::take(&mut *self.subscribers.write().unwrap_or_else(PoisonError::into_inner));
        debug!(removed = removed.len(), "cleared static event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    #[test]
    fn test_subscribe_and_dispatch() {
        let event = StaticEvent::<usize>::new();
        let total = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let total = total.clone();
            event.subscribe(move |value: &usize| {
                total.fetch_add(*value, Ordering::SeqCst);
            });
        }
        let empty: Option<fn(&usize)> = None;
        event.subscribe(empty);
        assert_eq!(event.count(), 3);

        event.dispatch(&2);
        assert_eq!(total.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn test_from_iter_and_clone() {
        let first: Callback<()> = Arc::new(|_: &()| {});
        let second: Callback<()> = Arc::new(|_: &()| {});
        let event: StaticEvent<()> = [first, second].into_iter().collect();
        assert_eq!(event.count(), 2);

        let copy = event.clone();
        event.clear();
        assert_eq!(event.count(), 0);
        assert_eq!(copy.count(), 2);
    }

    #[test]
    fn test_subscribe_during_dispatch() {
        let event = Arc::new(StaticEvent::<()>::new());
        let fired = Arc::new(AtomicUsize::new(0));
        {
            let inner = event.clone();
            let fired = fired.clone();
            event.subscribe(move |_: &()| {
                let fired = fired.clone();
                inner.subscribe(move |_: &()| {
                    fired.fetch_add(1, Ordering::SeqCst);
                });
            });
        }

        event.dispatch(&());
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(event.count(), 2);
        event.dispatch(&());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
