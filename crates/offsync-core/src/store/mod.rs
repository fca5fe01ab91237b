// ── Reactive view state ──
//
// Process-lifetime state machine for what presentation layers show.
// Mutations are broadcast through a `watch` channel and to registered
// listeners.

mod listeners;
mod view_state;
mod view_store;

pub use listeners::ListenerHandle;
pub use view_state::{LoadStatus, ViewState};
pub use view_store::ViewStore;
