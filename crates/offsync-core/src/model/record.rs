// ── Record identity and mutation payloads ──
//
// `SyncRecord` is the contract any timestamped, identifiable record type
// must meet to flow through the sync layer. The remote store is the source
// of truth; values here are immutable snapshots of what it returned.

use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

// ── RecordId ────────────────────────────────────────────────────────

/// Opaque record identifier assigned by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ── SyncRecord ──────────────────────────────────────────────────────

/// A record the sync layer can fetch, cache, and mutate.
///
/// Updates never mutate a record in place: the remote store returns a
/// new value which replaces the old one wherever it is held.
pub trait SyncRecord:
    Clone + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Caller-editable fields sent on create and update.
    type Fields: Clone + fmt::Debug + Serialize + Send + Sync + 'static;

    fn id(&self) -> &RecordId;
    fn created_at(&self) -> DateTime<Utc>;
    fn updated_at(&self) -> DateTime<Utc>;

    fn resolved_at(&self) -> Option<DateTime<Utc>> {
        None
    }

    /// Blob URLs currently linked to this record.
    fn attachments(&self) -> &[String] {
        &[]
    }
}

// ── Mutation payloads ───────────────────────────────────────────────

/// A file to upload to blob storage before the record write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl Attachment {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Input for `create`.
#[derive(Debug, Clone)]
pub struct NewRecord<F> {
    pub fields: F,
    pub attachments: Vec<Attachment>,
}

impl<F> NewRecord<F> {
    pub fn new(fields: F) -> Self {
        Self {
            fields,
            attachments: Vec::new(),
        }
    }

    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }
}

/// Input for `update`.
#[derive(Debug, Clone)]
pub struct RecordChanges<F> {
    pub fields: F,
    /// New files to upload and link.
    pub add_attachments: Vec<Attachment>,
    /// Blob URLs to unlink; their blobs are deleted once the update lands.
    pub remove_attachments: Vec<String>,
}

impl<F> RecordChanges<F> {
    pub fn new(fields: F) -> Self {
        Self {
            fields,
            add_attachments: Vec::new(),
            remove_attachments: Vec::new(),
        }
    }

    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.add_attachments.push(attachment);
        self
    }

    pub fn detach(mut self, blob_url: impl Into<String>) -> Self {
        self.remove_attachments.push(blob_url.into());
        self
    }
}

/// What the remote data source receives on create/update: the caller's
/// fields plus the full, already-uploaded attachment URL list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordDraft<F> {
    #[serde(flatten)]
    pub fields: F,
    pub attachments: Vec<String>,
}
