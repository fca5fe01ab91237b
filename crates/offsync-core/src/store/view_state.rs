use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::Display;

use crate::model::{FilterSpec, RecordId, SyncRecord};

/// Load progress. There is no terminal state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed,
}

/// Everything a presentation layer needs to render the record list.
#[derive(Debug, Clone)]
pub struct ViewState<R: SyncRecord> {
    /// Most-recent-first by insertion, not by any record date.
    pub records: Vec<Arc<R>>,
    pub selected: Option<Arc<R>>,
    /// Active filter; fetches without an explicit filter use this one.
    pub filters: FilterSpec,
    pub status: LoadStatus,
    pub error: Option<String>,
    /// Whether `records` came from the offline cache.
    pub is_offline: bool,
    /// When `records` last came from the remote store.
    pub last_sync: Option<DateTime<Utc>>,
}

impl<R: SyncRecord> Default for ViewState<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            selected: None,
            filters: FilterSpec::default(),
            status: LoadStatus::Idle,
            error: None,
            is_offline: false,
            last_sync: None,
        }
    }
}

impl<R: SyncRecord> ViewState<R> {
    pub fn is_loading(&self) -> bool {
        self.status == LoadStatus::Loading
    }

    pub fn record(&self, id: &RecordId) -> Option<&Arc<R>> {
        self.records.iter().find(|r| r.id() == id)
    }

    pub(crate) fn position(&self, id: &RecordId) -> Option<usize> {
        self.records.iter().position(|r| r.id() == id)
    }

    pub(crate) fn is_selected(&self, id: &RecordId) -> bool {
        self.selected.as_ref().is_some_and(|s| s.id() == id)
    }
}
