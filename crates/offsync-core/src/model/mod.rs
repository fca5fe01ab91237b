// ── Domain model ──
//
// Generic record contract, filter/cache-key value type, and the concrete
// health event record used by the CLI.

pub mod filter;
pub mod health_event;
pub mod record;

pub use filter::{DateRange, FilterPatch, FilterSpec};
pub use health_event::{EventCategory, HealthEvent, HealthEventFields, Severity};
pub use record::{Attachment, NewRecord, RecordChanges, RecordDraft, RecordId, SyncRecord};
