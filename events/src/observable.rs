use std::ops::{AddAssign, SubAssign};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::EventRegistry;

/// Which of the two channels of an [`ObservableValue`] fired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// About to change; the payload is the current value
    Changing,
    /// Changed; the payload is the new value
    Changed,
}

/// Payload of both observable channels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change<T> {
    pub phase: Phase,
    pub value: T,
}

/// Types with a unit step, for [`ObservableValue::increment`] and [`ObservableValue::decrement`]
pub trait One {
    const ONE: Self;
}

macro_rules! impl_one {
    ($($ty:ty => $one:expr),* $(,)?) => {
        $(
            impl One for $ty {
                const ONE: Self = $one;
            }
        )*
    };
}

impl_one!(
    i8 => 1, i16 => 1, i32 => 1, i64 => 1, i128 => 1, isize => 1,
    u8 => 1, u16 => 1, u32 => 1, u64 => 1, u128 => 1, usize => 1,
    f32 => 1.0, f64 => 1.0,
);

struct Inner<T> {
    value: RwLock<T>,
    // held from on_changing through on_change so concurrent mutations do not interleave.
    // Guards no data, so poisoning by a panicking subscriber is ignored.
    mutation: Mutex<()>,
    on_changing: EventRegistry<Change<T>>,
    on_change: EventRegistry<Change<T>>,
}

impl<T> Inner<T> {
    fn new(value: T, on_changing: EventRegistry<Change<T>>, on_change: EventRegistry<Change<T>>) -> Self {
        Self { value: RwLock::new(value), mutation: Mutex::new(()), on_changing, on_change }
    }

    fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let guard = self.value.read().expect("value lock is poisoned");
        f(&*guard)
    }
}

/// A value that notifies subscribers before and after every change.
///
/// Each mutation reads the current value and fires `on_changing` with it, applies the change,
/// then fires `on_change` with the new value. Mutations are serialized: the whole sequence runs
/// under a per-value mutation lock, so concurrent writers never see each other's "old" value.
/// The value lock itself is not held while subscribers run, so they may read the value, but a
/// subscriber that mutates the same value (directly or through another thread it waits on) deadlocks.
///
/// Cloning copies the value and the current subscribers of both channels into an independent
/// observable. Handles from the original do not validate against the copy. To share the
/// value itself, hand out [`ReadOnly`] views.
///
/// ```rust
/// use slotted_events::ObservableValue;
///
/// let mut counter = ObservableValue::new(1);
/// let _handle = counter.on_change().subscribe(|change: &slotted_events::Change<i32>| println!("now {}", change.value));
/// counter += 2;
/// assert_eq!(counter.get(), 3);
/// ```
pub struct ObservableValue<T>(Arc<Inner<T>>);

/// A read-only view sharing storage and channels with an [`ObservableValue`]
pub struct ReadOnly<T>(Arc<Inner<T>>);

impl<T: Clone> Clone for ObservableValue<T> {
    fn clone(&self) -> Self { Self(Arc::new(Inner::new(self.get(), self.0.on_changing.clone(), self.0.on_change.clone()))) }
}

impl<T> Clone for ReadOnly<T> {
    fn clone(&self) -> Self { Self(self.0.clone()) }
}

impl<T: Default> Default for ObservableValue<T> {
    fn default() -> Self { Self::new(T::default()) }
}

impl<T> ObservableValue<T> {
    pub fn new(value: T) -> Self {
        Self(Arc::new(Inner::new(value, EventRegistry::new(), EventRegistry::new())))
    }

    /// Channel fired with the current value right before it changes
    pub fn on_changing(&self) -> &EventRegistry<Change<T>> { &self.0.on_changing }

    /// Channel fired with the new value right after it changed
    pub fn on_change(&self) -> &EventRegistry<Change<T>> { &self.0.on_change }

    /// Calls a closure with a borrow of the current value
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R { self.0.with(f) }

    /// Read-only view downstream of this value
    pub fn readonly(&self) -> ReadOnly<T> { ReadOnly(self.0.clone()) }
}

impl<T: Clone> ObservableValue<T> {
    /// Returns a clone of the current value
    pub fn get(&self) -> T { self.0.with(T::clone) }

    /// Mutate the value in place, firing both channels around the mutation
    pub fn modify<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let _mutation = self.0.mutation.lock().unwrap_or_else(PoisonError::into_inner);
        self.0.on_changing.dispatch(&Change { phase: Phase::Changing, value: self.get() });
        let (result, value) = {
            let mut guard = self.0.value.write().expect("value lock is poisoned");
            let result = f(&mut *guard);
            (result, (*guard).clone())
        };
        self.0.on_change.dispatch(&Change { phase: Phase::Changed, value });
        result
    }

    pub fn set(&self, value: T) { self.modify(|current| *current = value) }
}

impl<T> ObservableValue<T>
where T: Clone + AddAssign + SubAssign + One
{
    /// Adds one and returns the previous value
    pub fn increment(&self) -> T {
        self.modify(|value| {
            let previous = value.clone();
            *value += T::ONE;
            previous
        })
    }

    /// Subtracts one and returns the previous value
    pub fn decrement(&self) -> T {
        self.modify(|value| {
            let previous = value.clone();
            *value -= T::ONE;
            previous
        })
    }
}

macro_rules! compound_assign {
    ($($trait:ident :: $method:ident),* $(,)?) => {
        $(
            impl<T> std::ops::$trait<T> for ObservableValue<T>
            where T: std::ops::$trait + Clone
            {
                fn $method(&mut self, rhs: T) { self.modify(|value| std::ops::$trait::$method(value, rhs)) }
            }
        )*
    };
}

compound_assign!(
    AddAssign::add_assign,
    SubAssign::sub_assign,
    MulAssign::mul_assign,
    DivAssign::div_assign,
    RemAssign::rem_assign,
    BitXorAssign::bitxor_assign,
    BitAndAssign::bitand_assign,
    BitOrAssign::bitor_assign,
);

impl<T> ReadOnly<T> {
    pub fn on_changing(&self) -> &EventRegistry<Change<T>> { &self.0.on_changing }

    pub fn on_change(&self) -> &EventRegistry<Change<T>> { &self.0.on_change }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R { self.0.with(f) }
}

impl<T: Clone> ReadOnly<T> {
    pub fn get(&self) -> T { self.0.with(T::clone) }
}

impl<T: std::fmt::Display> std::fmt::Display for ObservableValue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { self.with(|v| write!(f, "{}", v)) }
}

impl<T: std::fmt::Display> std::fmt::Display for ReadOnly<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { self.with(|v| write!(f, "{}", v)) }
}
