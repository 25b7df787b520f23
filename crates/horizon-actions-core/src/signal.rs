//! Signal/slot system for Horizon Actions.
//!
//! A [`Signal<Args>`] holds an ordered list of slots (callbacks). Emitting the
//! signal invokes every connected slot synchronously, in connection order, on
//! the emitting thread.
//!
//! Each slot runs inside its own panic boundary: a slot that panics is logged
//! and skipped, and the remaining slots still receive the notification. The
//! connection list is snapshotted before delivery, so slots may connect or
//! disconnect other slots (or themselves) while the signal is being emitted.
//!
//! # Example
//!
//! ```
//! use horizon_actions_core::Signal;
//!
//! let signal = Signal::<i32>::new();
//! let id = signal.connect(|value| println!("got {value}"));
//! signal.emit(42);
//! assert!(signal.disconnect(id));
//! ```

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::Mutex;
use slotmap::SlotMap;

use crate::logging::targets;

slotmap::new_key_type! {
    /// A unique identifier for a signal-slot connection.
    ///
    /// Returned by [`Signal::connect`] and used with [`Signal::disconnect`].
    pub struct ConnectionId;
}

type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

/// A type-safe signal that can have multiple connected slots.
///
/// # Type Parameter
///
/// - `Args`: The argument type passed to connected slots. Use `()` for signals
///   with no arguments, or a tuple for several.
pub struct Signal<Args> {
    /// Active connections. `SlotMap` iterates in slot order, so a separate
    /// sequence keeps delivery in connection order.
    connections: Mutex<Connections<Args>>,
}

struct Connections<Args> {
    slots: SlotMap<ConnectionId, Slot<Args>>,
    order: Vec<ConnectionId>,
}

impl<Args> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args> Signal<Args> {
    /// Create a new signal with no connections.
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(Connections {
                slots: SlotMap::with_key(),
                order: Vec::new(),
            }),
        }
    }

    /// Connect a slot (closure) to this signal.
    ///
    /// Returns a `ConnectionId` that can be used to disconnect the slot later.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let mut connections = self.connections.lock();
        let id = connections.slots.insert(Arc::new(slot));
        connections.order.push(id);
        id
    }

    /// Disconnect a specific slot by its connection ID.
    ///
    /// Returns `true` if the connection was found and removed.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        let mut connections = self.connections.lock();
        if connections.slots.remove(id).is_some() {
            connections.order.retain(|other| *other != id);
            true
        } else {
            false
        }
    }

    /// Disconnect all slots from this signal.
    pub fn disconnect_all(&self) {
        let mut connections = self.connections.lock();
        connections.slots.clear();
        connections.order.clear();
    }

    /// Get the number of connected slots.
    pub fn connection_count(&self) -> usize {
        self.connections.lock().slots.len()
    }

    /// Emit the signal, invoking all connected slots in connection order.
    ///
    /// Returns the number of slots that panicked. Those panics are logged at
    /// `error` level and do not stop delivery to the remaining slots.
    #[tracing::instrument(skip_all, target = "horizon_actions_core::signal", level = "trace")]
    pub fn emit(&self, args: Args) -> usize {
        let snapshot: Vec<(ConnectionId, Slot<Args>)> = {
            let connections = self.connections.lock();
            connections
                .order
                .iter()
                .filter_map(|id| connections.slots.get(*id).map(|slot| (*id, slot.clone())))
                .collect()
        };
        tracing::trace!(target: targets::SIGNAL, connection_count = snapshot.len(), "emitting signal");

        let mut failures = 0;
        for (id, slot) in snapshot {
            // A slot disconnected by an earlier slot in this emission is skipped.
            if !self.connections.lock().slots.contains_key(id) {
                continue;
            }
            if panic::catch_unwind(AssertUnwindSafe(|| slot(&args))).is_err() {
                failures += 1;
                tracing::error!(target: targets::SIGNAL, ?id, "slot panicked during emit");
            }
        }
        failures
    }
}

impl<Args> fmt::Debug for Signal<Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("connection_count", &self.connection_count())
            .finish()
    }
}

static_assertions::assert_impl_all!(Signal<String>: Send, Sync);
