// offsync-core: Offline-resilient sync layer between offsync-api and
// consumers (CLI and host applications).

pub mod cache;
pub mod clock;
pub mod config;
pub mod controller;
pub mod coordinator;
pub mod error;
pub mod http;
pub mod model;
pub mod persist;
pub mod preferences;
pub mod source;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use cache::{CacheEnvelope, CacheStore};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{RemoteConfig, SyncConfig, TlsVerification};
pub use controller::Controller;
pub use coordinator::{FetchOutcome, SyncCoordinator};
pub use error::{CoreError, RemoteError};
pub use persist::{FileKvStore, KvError, MemoryKvStore};
pub use preferences::{AccessibilitySettings, Preferences};
pub use source::{BlobStore, ConnectivityMonitor, KeyValueStore, RemoteDataSource, StaticConnectivity};
pub use store::{ListenerHandle, LoadStatus, ViewState, ViewStore};
pub use stream::ViewStream;

// Re-export model types at the crate root for ergonomics.
pub use model::{
    Attachment, DateRange, EventCategory, FilterPatch, FilterSpec, HealthEvent, HealthEventFields,
    NewRecord, RecordChanges, RecordDraft, RecordId, Severity, SyncRecord,
};
