/*!
Thread-safe publish/subscribe events with generational subscription handles

# Design requirements:
- Subscribe, unsubscribe and dispatch may be called concurrently from any thread, including from inside a callback
- Dispatches do not exclude each other; subscribe/unsubscribe are serialized
- A subscription is referenced by a small handle that never dangles: once the subscription is gone the handle is stale and every use of it is a no-op
- A stale handle must never affect a newer subscriber that reuses its slot (each slot carries a generation counter)
- Handles are not cloneable - at most one value owns a live subscription
- No deduplication by comparing callbacks. Identity is the handle

# Nomenclature:
- slot - one storage location for a callback within a registry
- generation - per-slot counter bumped on every subscribe/unsubscribe of that slot
- stale handle - a handle whose generation or registry no longer matches

# Basic usage

```rust
use slotted_events::*;

let event = EventRegistry::<(String, u32)>::new();
let mut handle = event.subscribe(|(name, age): &(String, u32)| println!("{name} is {age}"));
event.dispatch(&("Buffy".to_string(), 29));
// Should print:
// Buffy is 29
event.unsubscribe(&mut handle);
event.unsubscribe(&mut handle); // no-op
assert!(!handle.is_subscribed());
```

# Failure policy

Subscribers are not isolated from each other: if one panics, the ones after it are skipped
for that dispatch and the panic reaches the caller of `dispatch`. `try_dispatch` returns it
as a [`DispatchError`] instead.
*/

mod arena;
mod callback;
mod error;
mod guard;
mod handle;
mod observable;
mod registry;
mod static_event;

pub use callback::*;
pub use error::*;
pub use guard::*;
pub use handle::*;
pub use observable::*;
pub use registry::*;
pub use static_event::*;
