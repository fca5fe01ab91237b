// ── View state machine ──
//
// Idle → Loading → {Loaded, Failed}; Loaded/Failed → Loading on the next
// operation. Transitions apply in the order they are called, which is the
// order operations complete; overlapping fetches resolve last-write-wins.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::trace;

use super::listeners::{ListenerHandle, ListenerRegistry};
use super::{LoadStatus, ViewState};
use crate::clock::{Clock, SystemClock};
use crate::model::{FilterPatch, FilterSpec, RecordId, SyncRecord};
use crate::stream::ViewStream;

/// Single-writer reactive holder of [`ViewState`].
///
/// Presentation layers observe through [`snapshot`](Self::snapshot),
/// [`subscribe`](Self::subscribe), or [`on_change`](Self::on_change);
/// only the controller (or whatever composition root owns the store)
/// calls the transition methods.
pub struct ViewStore<R: SyncRecord> {
    state: watch::Sender<Arc<ViewState<R>>>,
    listeners: Arc<ListenerRegistry<R>>,
    clock: Arc<dyn Clock>,
}

impl<R: SyncRecord> ViewStore<R> {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let (state, _) = watch::channel(Arc::new(ViewState::default()));
        Self {
            state,
            listeners: Arc::new(ListenerRegistry::new()),
            clock,
        }
    }

    // ── Observation ──────────────────────────────────────────────────

    /// Current state (cheap `Arc` clone).
    pub fn snapshot(&self) -> Arc<ViewState<R>> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> ViewStream<R> {
        ViewStream::new(self.state.subscribe())
    }

    /// Register a callback invoked synchronously after every transition.
    pub fn on_change(
        &self,
        listener: impl Fn(&ViewState<R>) + Send + Sync + 'static,
    ) -> ListenerHandle<R> {
        self.listeners.register(Arc::new(listener))
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    // ── Fetch transitions ────────────────────────────────────────────

    /// Any state → `Loading`; clears the error.
    pub fn begin_fetch(&self) {
        self.apply("begin_fetch", |s| {
            s.status = LoadStatus::Loading;
            s.error = None;
        });
    }

    /// → `Loaded`. Replaces `records` wholesale. `last_sync` only moves
    /// when the data came from the remote store.
    pub fn fetch_succeeded(&self, records: Vec<R>, is_offline: bool) {
        let now = self.clock.now();
        self.apply("fetch_succeeded", |s| {
            s.records = records.into_iter().map(Arc::new).collect();
            s.status = LoadStatus::Loaded;
            s.error = None;
            s.is_offline = is_offline;
            if !is_offline {
                s.last_sync = Some(now);
            }
        });
    }

    /// → `Failed`. Records stay visible.
    pub fn fetch_failed(&self, message: impl Into<String>) {
        let message = message.into();
        self.apply("fetch_failed", |s| {
            s.status = LoadStatus::Failed;
            s.error = Some(message);
        });
    }

    pub fn set_offline(&self, is_offline: bool) {
        self.apply("set_offline", |s| s.is_offline = is_offline);
    }

    // ── Mutation transitions ─────────────────────────────────────────

    /// Prepend a confirmed record. Any entry with the same id is dropped
    /// first so the id appears exactly once, at the front.
    ///
    /// Record edits leave `status` and `error` alone: those track fetches.
    pub fn record_created(&self, record: R) {
        self.apply("record_created", |s| {
            s.records.retain(|r| r.id() != record.id());
            s.records.insert(0, Arc::new(record));
        });
    }

    /// Replace the matching record in place, and the selection if it
    /// points at the same id.
    pub fn record_updated(&self, record: R) {
        let record = Arc::new(record);
        self.apply("record_updated", |s| {
            if let Some(idx) = s.position(record.id()) {
                s.records[idx] = Arc::clone(&record);
            }
            if s.is_selected(record.id()) {
                s.selected = Some(Arc::clone(&record));
            }
        });
    }

    /// Remove the matching record; clear the selection if it matched.
    pub fn record_deleted(&self, id: &RecordId) {
        self.apply("record_deleted", |s| {
            s.records.retain(|r| r.id() != id);
            if s.is_selected(id) {
                s.selected = None;
            }
        });
    }

    /// A create/update/delete was rejected. Records and selection are
    /// untouched; no speculative record ever entered the list.
    pub fn mutation_failed(&self, message: impl Into<String>) {
        let message = message.into();
        self.apply("mutation_failed", |s| {
            s.status = LoadStatus::Failed;
            s.error = Some(message);
        });
    }

    // ── Local edits ──────────────────────────────────────────────────

    pub fn select(&self, record: Option<R>) {
        let record = record.map(Arc::new);
        self.apply("select", |s| s.selected = record);
    }

    /// Select by id among the loaded records. Unknown ids clear the
    /// selection.
    pub fn select_id(&self, id: &RecordId) {
        self.apply("select_id", |s| s.selected = s.record(id).cloned());
    }

    pub fn set_filters(&self, patch: FilterPatch) {
        self.apply("set_filters", |s| s.filters = s.filters.merged(patch));
    }

    pub fn clear_filters(&self) {
        self.apply("clear_filters", |s| s.filters = FilterSpec::default());
    }

    pub fn clear_error(&self) {
        self.apply("clear_error", |s| s.error = None);
    }

    /// Back to the initial `Idle` state. Listeners stay registered.
    pub fn reset(&self) {
        self.apply("reset", |s| *s = ViewState::default());
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn apply(&self, transition: &'static str, f: impl FnOnce(&mut ViewState<R>)) {
        // `send_modify` updates unconditionally, even with zero receivers.
        self.state.send_modify(|state| f(Arc::make_mut(state)));

        let state = self.snapshot();
        trace!(
            transition,
            status = %state.status,
            records = state.records.len(),
            offline = state.is_offline,
            "view state transition"
        );
        self.listeners.notify(&state);
    }
}

impl<R: SyncRecord> Default for ViewStore<R> {
    fn default() -> Self {
        Self::new()
    }
}
