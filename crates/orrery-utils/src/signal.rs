//! Single-threaded event sources with connection tokens.
//!
//! A [`Signal`] is a list of boxed handlers addressed by [`ConnectionId`];
//! a [`Property`] is a value that emits a change signal when its value
//! actually changes. Both use interior mutability so that services holding
//! them can be shared as plain `Rc` handles inside the render-loop thread.

use std::cell::{Cell, RefCell};

/// Token returned by [`Signal::connect`], used to release the handler again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

struct Slot<T> {
    id: ConnectionId,
    handler: Box<dyn FnMut(&T)>,
}

/// A multicast event source for one value type.
///
/// Handlers run synchronously in connection order. Emission takes the slot
/// list out of the cell before invoking handlers, so a handler may connect
/// or disconnect on the same signal without tripping a borrow. While the
/// list is taken out, disconnects are deferred and applied once the pass
/// completes.
pub struct Signal<T> {
    next_id: Cell<u64>,
    slots: RefCell<Vec<Slot<T>>>,
    // true while the slot list is taken out for a handler pass
    emitting: Cell<bool>,
    // disconnects requested during that pass
    pending_removals: RefCell<Vec<ConnectionId>>,
}

impl<T> Signal<T> {
    pub fn new() -> Self {
        Self {
            next_id: Cell::new(0),
            slots: RefCell::new(Vec::new()),
            emitting: Cell::new(false),
            pending_removals: RefCell::new(Vec::new()),
        }
    }

    /// Register a handler; the returned token releases it again.
    pub fn connect(&self, handler: impl FnMut(&T) + 'static) -> ConnectionId {
        let id = ConnectionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.slots.borrow_mut().push(Slot {
            id,
            handler: Box::new(handler),
        });
        id
    }

    /// Release a previously connected handler. Unknown tokens are ignored.
    pub fn disconnect(&self, id: ConnectionId) {
        if self.emitting.get() {
            // called from inside emit(); the slot list is taken out, so the
            // removal is applied once the pass finishes
            self.pending_removals.borrow_mut().push(id);
            return;
        }
        self.slots.borrow_mut().retain(|slot| slot.id != id);
    }

    /// Invoke every connected handler with `value`.
    pub fn emit(&self, value: &T) {
        let was_emitting = self.emitting.replace(true);
        let mut slots = self.slots.take();
        for slot in &mut slots {
            (slot.handler)(value);
        }
        // handlers may have connected new slots meanwhile; keep them after
        // the original ones
        let added = self.slots.take();
        slots.extend(added);
        self.emitting.set(was_emitting);
        if !was_emitting {
            let removed = self.pending_removals.take();
            if !removed.is_empty() {
                slots.retain(|slot| !removed.contains(&slot.id));
            }
        }
        *self.slots.borrow_mut() = slots;
    }

    /// Number of currently connected handlers.
    pub fn connection_count(&self) -> usize {
        self.slots.borrow().len()
    }
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// An observable value. Setting a different value emits `on_change`;
/// setting an equal value is a no-op.
pub struct Property<T> {
    value: RefCell<T>,
    on_change: Signal<T>,
}

impl<T: Clone + PartialEq> Property<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: RefCell::new(value),
            on_change: Signal::new(),
        }
    }

    pub fn get(&self) -> T {
        self.value.borrow().clone()
    }

    pub fn set(&self, value: T) {
        if *self.value.borrow() == value {
            return;
        }
        *self.value.borrow_mut() = value.clone();
        self.on_change.emit(&value);
    }

    /// The change signal, for registering observers.
    pub fn on_change(&self) -> &Signal<T> {
        &self.on_change
    }
}
