// ── Explicit observer registration ──
//
// Callbacks registered with `ViewStore::on_change`. Each registration
// hands back a `ListenerHandle`; dropping or unsubscribing it removes
// the callback.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;

use super::ViewState;
use crate::model::SyncRecord;

pub(crate) type Listener<R> = Arc<dyn Fn(&ViewState<R>) + Send + Sync>;

pub(crate) struct ListenerRegistry<R: SyncRecord> {
    next_id: AtomicU64,
    listeners: DashMap<u64, Listener<R>>,
}

impl<R: SyncRecord> ListenerRegistry<R> {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            listeners: DashMap::new(),
        }
    }

    pub(crate) fn register(self: &Arc<Self>, listener: Listener<R>) -> ListenerHandle<R> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.insert(id, listener);
        ListenerHandle {
            id,
            registry: Arc::downgrade(self),
        }
    }

    /// Invoke every listener with `state`.
    ///
    /// Listeners are collected first so a callback may unsubscribe (or
    /// register) without deadlocking on the map.
    pub(crate) fn notify(&self, state: &ViewState<R>) {
        let listeners: Vec<Listener<R>> = self
            .listeners
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        for listener in listeners {
            listener(state);
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.len()
    }
}

/// Registration handle. The listener stays active until this is
/// dropped or [`unsubscribe`](Self::unsubscribe)d.
#[must_use = "dropping the handle unregisters the listener immediately"]
pub struct ListenerHandle<R: SyncRecord> {
    id: u64,
    registry: Weak<ListenerRegistry<R>>,
}

impl<R: SyncRecord> ListenerHandle<R> {
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl<R: SyncRecord> Drop for ListenerHandle<R> {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.listeners.remove(&self.id);
        }
    }
}

impl<R: SyncRecord> std::fmt::Debug for ListenerHandle<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerHandle").field("id", &self.id).finish()
    }
}
