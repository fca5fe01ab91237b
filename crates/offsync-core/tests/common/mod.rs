// Shared in-memory collaborators for the coordinator and controller tests.
#![allow(clippy::unwrap_used, dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};

use offsync_core::{
    EventCategory, FilterSpec, HealthEvent, HealthEventFields, KeyValueStore, KvError,
    RecordDraft, RecordId, RemoteDataSource, RemoteError, Severity, BlobStore,
};

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
}

pub fn event(id: &str, title: &str) -> HealthEvent {
    HealthEvent {
        id: RecordId::from(id),
        title: title.into(),
        description: String::new(),
        category: EventCategory::Symptom,
        severity: Severity::Low,
        attachments: Vec::new(),
        created_at: t0(),
        updated_at: t0(),
        resolved_at: None,
    }
}

pub fn fields(title: &str) -> HealthEventFields {
    HealthEventFields::new(title, EventCategory::Symptom)
}

// ── Remote ───────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeRemote {
    pub records: Mutex<Vec<HealthEvent>>,
    pub list_calls: AtomicUsize,
    pub write_calls: AtomicUsize,
    pub fail_list: Mutex<Option<RemoteError>>,
    pub fail_writes: Mutex<Option<RemoteError>>,
    pub last_draft: Mutex<Option<RecordDraft<HealthEventFields>>>,
    next_id: AtomicUsize,
}

impl FakeRemote {
    pub fn with_records(records: Vec<HealthEvent>) -> Self {
        let remote = Self::default();
        *remote.records.lock().unwrap() = records;
        remote
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    pub fn fail_list_with(&self, err: RemoteError) {
        *self.fail_list.lock().unwrap() = Some(err);
    }

    pub fn fail_writes_with(&self, err: RemoteError) {
        *self.fail_writes.lock().unwrap() = Some(err);
    }

    fn write_failure(&self) -> Option<RemoteError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        self.fail_writes.lock().unwrap().clone()
    }

    fn hydrate(id: RecordId, draft: &RecordDraft<HealthEventFields>) -> HealthEvent {
        HealthEvent {
            id,
            title: draft.fields.title.clone(),
            description: draft.fields.description.clone(),
            category: draft.fields.category,
            severity: draft.fields.severity,
            attachments: draft.attachments.clone(),
            created_at: t0(),
            updated_at: t0(),
            resolved_at: draft.fields.resolved_at,
        }
    }
}

#[async_trait]
impl RemoteDataSource<HealthEvent> for FakeRemote {
    async fn list(&self, _filter: &FilterSpec) -> Result<Vec<HealthEvent>, RemoteError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.fail_list.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.records.lock().unwrap().clone())
    }

    async fn get(&self, id: &RecordId) -> Result<Option<HealthEvent>, RemoteError> {
        Ok(self.records.lock().unwrap().iter().find(|r| &r.id == id).cloned())
    }

    async fn create(
        &self,
        draft: RecordDraft<HealthEventFields>,
    ) -> Result<HealthEvent, RemoteError> {
        if let Some(err) = self.write_failure() {
            return Err(err);
        }
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let record = Self::hydrate(RecordId::new(format!("new-{n}")), &draft);
        *self.last_draft.lock().unwrap() = Some(draft);
        self.records.lock().unwrap().insert(0, record.clone());
        Ok(record)
    }

    async fn update(
        &self,
        id: &RecordId,
        draft: RecordDraft<HealthEventFields>,
    ) -> Result<HealthEvent, RemoteError> {
        if let Some(err) = self.write_failure() {
            return Err(err);
        }
        let record = Self::hydrate(id.clone(), &draft);
        *self.last_draft.lock().unwrap() = Some(draft);
        let mut records = self.records.lock().unwrap();
        let slot = records.iter_mut().find(|r| &r.id == id).ok_or(RemoteError::NotFound)?;
        *slot = record.clone();
        Ok(record)
    }

    async fn delete(&self, id: &RecordId) -> Result<(), RemoteError> {
        if let Some(err) = self.write_failure() {
            return Err(err);
        }
        self.records.lock().unwrap().retain(|r| &r.id != id);
        Ok(())
    }
}

// ── Blobs ────────────────────────────────────────────────────────────

/// Uploads whose name ends with `fail_suffix` are rejected.
#[derive(Default)]
pub struct FakeBlobs {
    pub uploaded: Mutex<Vec<String>>,
    pub deleted: Mutex<Vec<String>>,
    pub fail_suffix: Mutex<Option<String>>,
}

impl FakeBlobs {
    pub fn failing_on(suffix: &str) -> Self {
        let blobs = Self::default();
        *blobs.fail_suffix.lock().unwrap() = Some(suffix.into());
        blobs
    }

    pub fn uploaded(&self) -> Vec<String> {
        self.uploaded.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl BlobStore for FakeBlobs {
    async fn upload(
        &self,
        _bytes: Bytes,
        name: &str,
        _content_type: Option<&str>,
    ) -> Result<String, RemoteError> {
        let rejected = self
            .fail_suffix
            .lock()
            .unwrap()
            .as_deref()
            .is_some_and(|suffix| name.ends_with(suffix));
        if rejected {
            return Err(RemoteError::failed("bucket quota exceeded"));
        }
        let url = format!("https://blobs.test/{name}");
        self.uploaded.lock().unwrap().push(url.clone());
        Ok(url)
    }

    async fn delete(&self, url: &str) -> Result<(), RemoteError> {
        self.deleted.lock().unwrap().push(url.into());
        Ok(())
    }
}

// ── Storage ──────────────────────────────────────────────────────────

/// A store whose every operation fails.
pub struct BrokenKv;

#[async_trait]
impl KeyValueStore for BrokenKv {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, KvError> {
        Err(KvError::InvalidKey(key.into()))
    }

    async fn write(&self, _key: &str, _bytes: &[u8]) -> Result<(), KvError> {
        Err(KvError::Io(std::io::Error::other("disk full")))
    }

    async fn remove(&self, key: &str) -> Result<(), KvError> {
        Err(KvError::InvalidKey(key.into()))
    }

    async fn keys(&self) -> Result<Vec<String>, KvError> {
        Err(KvError::Io(std::io::Error::other("disk gone")))
    }
}
