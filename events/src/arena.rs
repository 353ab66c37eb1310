use crate::{callback::Callback, handle::Generation};

/// One entry in the arena. Active iff `callback` is set; the generation only carries identity.
struct Slot<A> {
    callback: Option<Callback<A>>,
    generation: Generation,
}

impl<A> Clone for Slot<A> {
    fn clone(&self) -> Self { Self { callback: self.callback.clone(), generation: self.generation } }
}

/// Growable table of callback slots with a free list of reusable indices.
///
/// The arena has no locking of its own; [`EventRegistry`](crate::EventRegistry) manipulates it under its lock.
pub(crate) struct SlotArena<A> {
    slots: Vec<Slot<A>>,
    free: Vec<usize>,
    active: usize,
}

impl<A> Clone for SlotArena<A> {
    fn clone(&self) -> Self { Self { slots: self.slots.clone(), free: self.free.clone(), active: self.active } }
}

impl<A> Default for SlotArena<A> {
    fn default() -> Self { Self::new() }
}

impl<A> SlotArena<A> {
    pub fn new() -> Self { Self::with_capacity(0) }

    pub fn with_capacity(capacity: usize) -> Self { Self { slots: Vec::with_capacity(capacity), free: Vec::new(), active: 0 } }

    /// Install a callback, reusing a freed slot when one is available
    pub fn allocate(&mut self, callback: Callback<A>) -> (usize, Generation) {
        self.active += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.generation.bump();
            slot.callback = Some(callback);
            return (index, slot.generation);
        }

        let mut generation = Generation::UNISSUED;
        generation.bump();
        self.slots.push(Slot { callback: Some(callback), generation });
        (self.slots.len() - 1, generation)
    }

    /// Deactivate a slot and queue it for reuse.
    ///
    /// Returns the removed callback so the caller can drop it outside its lock.
    /// Returns `None` without touching anything if the slot is not active.
    pub fn release(&mut self, index: usize) -> Option<Callback<A>> {
        let slot = self.slots.get_mut(index)?;
        let callback = slot.callback.take()?;
        slot.generation.bump();
        self.free.push(index);
        self.active -= 1;
        Some(callback)
    }

    /// Whether `index` holds an active callback issued at `generation`
    pub fn is_active(&self, index: usize, generation: Generation) -> bool {
        match self.slots.get(index) {
            Some(slot) => slot.generation == generation && slot.callback.is_some(),
            None => false,
        }
    }

    /// Visit active slots in index order
    pub fn for_each_active(&self, mut visitor: impl FnMut(usize, Generation, &Callback<A>)) {
        for (index, slot) in self.slots.iter().enumerate() {
            if let Some(callback) = &slot.callback {
                visitor(index, slot.generation, callback);
            }
        }
    }

    /// Clone out the active entries in index order
    pub fn snapshot(&self) -> Vec<(usize, Generation, Callback<A>)> {
        let mut entries = Vec::with_capacity(self.active);
        self.for_each_active(|index, generation, callback| entries.push((index, generation, callback.clone())));
        entries
    }

    pub fn active_count(&self) -> usize { self.active }

    /// Deactivate every slot. Every index becomes free, lowest index reused first.
    ///
    /// Generations of active slots are bumped so that outstanding handles go stale
    /// instead of matching whatever gets allocated into their slot next.
    pub fn deactivate_all(&mut self) -> Vec<Callback<A>> {
        let mut removed = Vec::with_capacity(self.active);
        for slot in self.slots.iter_mut() {
            if let Some(callback) = slot.callback.take() {
                slot.generation.bump();
                removed.push(callback);
            }
        }
        self.free = (0..self.slots.len()).rev().collect();
        self.active = 0;
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn noop() -> Callback<()> { Arc::new(|_: &()| {}) }

    #[test]
    fn test_allocate_appends_with_generation_one() {
        let mut arena = SlotArena::new();
        let (a, gen_a) = arena.allocate(noop());
        let (b, gen_b) = arena.allocate(noop());
        assert_eq!((a, gen_a.get()), (0, 1));
        assert_eq!((b, gen_b.get()), (1, 1));
        assert_eq!(arena.active_count(), 2);
    }

    #[test]
    fn test_release_then_reuse_bumps_generation() {
        let mut arena = SlotArena::new();
        let (index, first) = arena.allocate(noop());
        assert!(arena.release(index).is_some());
        assert!(!arena.is_active(index, first));

        let (reused, second) = arena.allocate(noop());
        assert_eq!(reused, index);
        assert_eq!(second.get(), 3); // active -> free -> active
        assert!(arena.is_active(reused, second));
        assert!(!arena.is_active(reused, first));
    }

    #[test]
    fn test_release_inactive_slot_is_ignored() {
        let mut arena = SlotArena::new();
        let (index, _) = arena.allocate(noop());
        assert!(arena.release(index).is_some());
        assert!(arena.release(index).is_none());
        assert!(arena.release(42).is_none());
        assert_eq!(arena.active_count(), 0);

        // the free list must not contain the index twice
        arena.allocate(noop());
        let (next, _) = arena.allocate(noop());
        assert_eq!(next, 1);
    }

    #[test]
    fn test_out_of_bounds_is_inactive() {
        let arena = SlotArena::<()>::new();
        let mut generation = Generation::UNISSUED;
        generation.bump();
        assert!(!arena.is_active(0, generation));
    }

    #[test]
    fn test_for_each_active_skips_released() {
        let mut arena = SlotArena::new();
        for _ in 0..4 {
            arena.allocate(noop());
        }
        arena.release(1);
        arena.release(3);

        let mut visited = Vec::new();
        arena.for_each_active(|index, _, _| visited.push(index));
        assert_eq!(visited, vec![0, 2]);
        assert_eq!(arena.snapshot().len(), 2);
    }

    #[test]
    fn test_deactivate_all_reuses_lowest_index_first() {
        let mut arena = SlotArena::new();
        let (_, old) = arena.allocate(noop());
        arena.allocate(noop());
        assert_eq!(arena.deactivate_all().len(), 2);
        assert_eq!(arena.active_count(), 0);

        let (index, generation) = arena.allocate(noop());
        assert_eq!(index, 0);
        assert_ne!(generation, old);
        assert!(!arena.is_active(0, old));
    }
}
