use std::sync::atomic::{AtomicUsize, Ordering};

/// A unique identifier for a registry that cannot be forged.
/// Ids come from a process-wide counter and are never reissued, so a handle can
/// never validate against a registry other than the one that issued it.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct RegistryId(usize);

/// Zero is never issued; it marks handles that were never subscribed.
static NEXT_REGISTRY_ID: AtomicUsize = AtomicUsize::new(1);

impl RegistryId {
    pub(crate) fn next() -> Self { Self(NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed)) }

    pub(crate) const UNISSUED: Self = Self(0);
}

impl std::fmt::Display for RegistryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.0) }
}

/// Per-slot generation counter.
///
/// Bumped on every activate/deactivate transition of a slot. Wraps after 2^32
/// transitions of the same slot; a stale handle that happens to match a wrapped
/// generation is not detected.
#[derive(Debug, Clone, Copy, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Generation(u32);

impl Generation {
    /// Generation of a slot that has never been issued
    pub const UNISSUED: Self = Self(0);

    pub(crate) fn bump(&mut self) { self.0 = self.0.wrapping_add(1); }

    pub fn get(&self) -> u32 { self.0 }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.0) }
}

/// A handle to one subscription, returned by [`EventRegistry::subscribe`](crate::EventRegistry::subscribe).
///
/// Handles are intentionally neither `Clone` nor `Copy`: at most one value believes it owns a live subscription.
/// A handle does not keep the registry alive and does not unsubscribe on drop. Once the subscription
/// ends (through this handle, or because the registry was cleared) the handle is stale, and every
/// operation on it is a no-op.
#[derive(Debug)]
pub struct SubscriptionHandle {
    pub(crate) registry: RegistryId,
    pub(crate) slot: usize,
    pub(crate) generation: Generation,
    pub(crate) live: bool,
}

impl SubscriptionHandle {
    pub(crate) fn new(registry: RegistryId, slot: usize, generation: Generation) -> Self {
        Self { registry, slot, generation, live: true }
    }

    /// True until this handle is passed to `unsubscribe` on the registry that issued it.
    ///
    /// This is a local flag. Use [`EventRegistry::is_subscribed`](crate::EventRegistry::is_subscribed)
    /// to check the handle against the registry itself.
    pub fn is_subscribed(&self) -> bool { self.live }

    /// The registry that issued this handle
    pub fn registry_id(&self) -> RegistryId { self.registry }

    pub fn slot(&self) -> usize { self.slot }

    pub fn generation(&self) -> Generation { self.generation }
}

impl Default for SubscriptionHandle {
    /// A handle that was never subscribed
    fn default() -> Self { Self { registry: RegistryId::UNISSUED, slot: 0, generation: Generation::UNISSUED, live: false } }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_handle_is_not_subscribed() {
        let handle = SubscriptionHandle::default();
        assert!(!handle.is_subscribed());
        assert_eq!(handle.generation(), Generation::UNISSUED);
        assert_eq!(handle.registry_id(), RegistryId::UNISSUED);
    }

    #[test]
    fn test_registry_ids_are_unique() {
        let a = RegistryId::next();
        let b = RegistryId::next();
        assert_ne!(a, b);
        assert_ne!(a, RegistryId::UNISSUED);
    }

    #[test]
    fn test_generation_wraps() {
        let mut generation = Generation(u32::MAX);
        generation.bump();
        assert_eq!(generation.get(), 0);
    }
}
