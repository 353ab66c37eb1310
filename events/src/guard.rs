use std::sync::{Arc, Weak};

use crate::{EventRegistry, IntoCallback, SubscriptionHandle};

/// A subscription that unsubscribes itself when dropped.
///
/// The guard does not keep the registry alive. If the registry is dropped first, dropping the guard does nothing.
pub struct SubscriptionGuard<A> {
    registry: Weak<EventRegistry<A>>,
    handle: SubscriptionHandle,
}

impl<A> EventRegistry<A> {
    /// Subscribe a callback for as long as the returned guard lives
    pub fn subscribe_guarded<C>(self: &Arc<Self>, callback: C) -> SubscriptionGuard<A>
    where C: IntoCallback<A> {
        SubscriptionGuard { registry: Arc::downgrade(self), handle: self.subscribe(callback) }
    }
}

impl<A> SubscriptionGuard<A> {
    pub fn is_subscribed(&self) -> bool { self.handle.is_subscribed() }

    pub fn handle(&self) -> &SubscriptionHandle { &self.handle }

    /// Detach the guard, keeping the subscription active after the guard is gone
    pub fn into_handle(mut self) -> SubscriptionHandle {
        self.registry = Weak::new();
        std::mem::take(&mut self.handle)
    }
}

impl<A> Drop for SubscriptionGuard<A> {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.unsubscribe(&mut self.handle);
        }
    }
}
