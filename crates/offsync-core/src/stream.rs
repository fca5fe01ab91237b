// ── Reactive view streams ──
//
// Subscription type for consuming view state changes from the ViewStore.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::SyncRecord;
use crate::store::ViewState;

/// A subscription to the view state.
///
/// Provides both point-in-time snapshot access and reactive change
/// notification via the `changed()` method or by converting to a `Stream`.
pub struct ViewStream<R: SyncRecord> {
    current: Arc<ViewState<R>>,
    receiver: watch::Receiver<Arc<ViewState<R>>>,
}

impl<R: SyncRecord> ViewStream<R> {
    pub(crate) fn new(receiver: watch::Receiver<Arc<ViewState<R>>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// Get the snapshot captured at creation time (or at the last `changed()`).
    pub fn current(&self) -> &Arc<ViewState<R>> {
        &self.current
    }

    /// Get the latest snapshot (may have changed since creation).
    pub fn latest(&self) -> Arc<ViewState<R>> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change, returning the new snapshot.
    /// Returns `None` if the ViewStore has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<ViewState<R>>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    pub fn into_stream(self) -> ViewWatchStream<R> {
        ViewWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter backed by a `watch::Receiver`.
///
/// Yields the current snapshot first, then a new one after each transition.
pub struct ViewWatchStream<R: SyncRecord> {
    inner: WatchStream<Arc<ViewState<R>>>,
}

impl<R: SyncRecord> Stream for ViewWatchStream<R> {
    type Item = Arc<ViewState<R>>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        // WatchStream is Unpin, so projecting through `&mut` is fine.
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
