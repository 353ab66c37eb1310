use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, trace, warn};

use crate::{
    arena::SlotArena,
    callback::IntoCallback,
    error::DispatchError,
    handle::{RegistryId, SubscriptionHandle},
};

/// A thread-safe event channel.
///
/// Subscribers are callbacks taking `&A`; use a tuple for multiple arguments.
/// `subscribe` and `unsubscribe` are serialized behind a write lock, while any number
/// of `dispatch` calls may run at once.
///
/// # Dispatch semantics
/// - Callbacks run in slot order with no registry lock held, so a callback may
///   subscribe, unsubscribe (itself or others) or dispatch again.
/// - Because no lock is held, `unsubscribe` does not wait for in-flight dispatches: a callback
///   may still be running, or be about to run once more, on another thread after `unsubscribe`
///   returned. Do not tear down state the callback captured on the assumption that it will not be called again.
/// - Each callback is checked for activity right before it is invoked: one that was
///   unsubscribed earlier in the same pass is skipped. One subscribed during a pass
///   first runs on the next dispatch.
/// - A panicking subscriber aborts the rest of the dispatch. Subscribers after it in
///   slot order are **not** invoked for that call, so one misbehaving subscriber can deny
///   service to the others. Use [`try_dispatch`](Self::try_dispatch) to receive the failure as a value.
///
/// ```rust
/// use slotted_events::EventRegistry;
///
/// let event = EventRegistry::<i32>::new();
/// let mut handle = event.subscribe(|value: &i32| println!("got {value}"));
/// event.dispatch(&42);
/// event.unsubscribe(&mut handle);
/// assert_eq!(event.count(), 0);
/// ```
pub struct EventRegistry<A> {
    id: RegistryId,
    arena: RwLock<SlotArena<A>>,
}

impl<A> Default for EventRegistry<A> {
    fn default() -> Self { Self::new() }
}

impl<A> std::fmt::Debug for EventRegistry<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRegistry").field("id", &self.id).field("subscribers", &self.count()).finish()
    }
}

impl<A> Clone for EventRegistry<A> {
    /// Copies the current subscribers into a registry with a fresh identity.
    /// Handles issued by `self` do not validate against the copy.
    fn clone(&self) -> Self { Self { id: RegistryId::next(), arena: RwLock::new(self.read().clone()) } }
}

impl<A> EventRegistry<A> {
    pub fn new() -> Self { Self::with_capacity(0) }

    /// Creates a registry with room for `capacity` subscribers before the slot table grows
    pub fn with_capacity(capacity: usize) -> Self { Self { id: RegistryId::next(), arena: RwLock::new(SlotArena::with_capacity(capacity)) } }

    pub fn id(&self) -> RegistryId { self.id }

    // The arena is consistent before any user code can run under the write lock,
    // so a poisoned lock is safe to keep using.
    fn read(&self) -> RwLockReadGuard<'_, SlotArena<A>> { self.arena.read().unwrap_or_else(PoisonError::into_inner) }

    fn write(&self) -> RwLockWriteGuard<'_, SlotArena<A>> { self.arena.write().unwrap_or_else(PoisonError::into_inner) }

    /// Subscribe a callback.
    ///
    /// An empty callback (`None`) is ignored and yields a handle that reports `is_subscribed() == false`.
    pub fn subscribe<C>(&self, callback: C) -> SubscriptionHandle
    where C: IntoCallback<A> {
        let Some(callback) = callback.into_callback() else {
            trace!(registry = %self.id, "ignoring empty callback");
            return SubscriptionHandle::default();
        };

        let (slot, generation) = self.write().allocate(callback);
        trace!(registry = %self.id, slot, %generation, "subscribed");
        SubscriptionHandle::new(self.id, slot, generation)
    }

    /// Unsubscribe the callback referenced by `handle`.
    ///
    /// No effect if the handle was issued by another registry, was already unsubscribed,
    /// or refers to a slot that has since been released (and possibly reused by someone else).
    /// Safe to call from inside a callback during [`dispatch`](Self::dispatch).
    pub fn unsubscribe(&self, handle: &mut SubscriptionHandle) {
        if handle.registry != self.id {
            trace!(registry = %self.id, issuer = %handle.registry, "ignoring handle from another registry");
            return;
        }
        if !handle.live {
            return;
        }

        let removed = {
            let mut arena = self.write();
            if arena.is_active(handle.slot, handle.generation) { arena.release(handle.slot) } else { None }
        };
        handle.live = false;

        match removed {
            Some(callback) => {
                trace!(registry = %self.id, slot = handle.slot, generation = %handle.generation, "unsubscribed");
                // dropped here, outside the lock, in case the callback's captures touch this registry
                drop(callback);
            }
            None => trace!(registry = %self.id, slot = handle.slot, generation = %handle.generation, "stale handle"),
        }
    }

    /// Whether `handle` currently refers to an active subscription of this registry
    pub fn is_subscribed(&self, handle: &SubscriptionHandle) -> bool {
        handle.live && handle.registry == self.id && self.read().is_active(handle.slot, handle.generation)
    }

    /// Invoke every active callback with `args`.
    ///
    /// No lock is held while a callback runs. An `unsubscribe` racing from another thread may
    /// return before this dispatch is done with the callback.
    ///
    /// A panic in a subscriber propagates to the caller and the remaining subscribers are skipped.
    pub fn dispatch(&self, args: &A) {
        let entries = self.read().snapshot();
        for (slot, generation, callback) in entries {
            if !self.read().is_active(slot, generation) {
                continue;
            }
            callback(args);
        }
    }

    /// Like [`dispatch`](Self::dispatch), but a subscriber panic is caught and returned.
    ///
    /// The policy is unchanged: subscribers after the one that panicked are not invoked.
    pub fn try_dispatch(&self, args: &A) -> Result<(), DispatchError> {
        let entries = self.read().snapshot();
        for (slot, generation, callback) in entries {
            if !self.read().is_active(slot, generation) {
                continue;
            }
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| callback(args))) {
                let err = DispatchError::from_panic(slot, payload);
                warn!(registry = %self.id, slot, "{}", err);
                return Err(err);
            }
        }
        Ok(())
    }

    /// Number of active subscriptions
    pub fn count(&self) -> usize { self.read().active_count() }

    /// Remove every subscription.
    ///
    /// **Intended for tests only.** Holders of outstanding handles are not notified;
    /// their handles simply go stale.
    pub fn clear(&self) {
        let removed = self.write().deactivate_all();
        debug!(registry = %self.id, removed = removed.len(), "cleared");
        // the write guard is already gone; dropping callbacks may re-enter this registry
        drop(removed);
    }
}
