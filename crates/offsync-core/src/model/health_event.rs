// ── Health event domain type ──
//
// The record type the shipped CLI synchronizes. Category and severity
// serialize as lowercase strings so they double as filter categories.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::record::{RecordId, SyncRecord};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[non_exhaustive]
pub enum EventCategory {
    Symptom,
    Medication,
    Appointment,
    Measurement,
    Injury,
    Other,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
}

/// A health event as stored remotely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthEvent {
    pub id: RecordId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: EventCategory,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub attachments: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl HealthEvent {
    pub fn is_resolved(&self) -> bool {
        self.resolved_at.is_some()
    }
}

/// Caller-editable fields of a [`HealthEvent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthEventFields {
    pub title: String,
    pub description: String,
    pub category: EventCategory,
    pub severity: Severity,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl HealthEventFields {
    pub fn new(title: impl Into<String>, category: EventCategory) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            category,
            severity: Severity::default(),
            resolved_at: None,
        }
    }

    /// Fields carried over from an existing event, ready for editing.
    pub fn from_event(event: &HealthEvent) -> Self {
        Self {
            title: event.title.clone(),
            description: event.description.clone(),
            category: event.category,
            severity: event.severity,
            resolved_at: event.resolved_at,
        }
    }
}

impl SyncRecord for HealthEvent {
    type Fields = HealthEventFields;

    fn id(&self) -> &RecordId {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn resolved_at(&self) -> Option<DateTime<Utc>> {
        self.resolved_at
    }

    fn attachments(&self) -> &[String] {
        &self.attachments
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_camel_case_with_defaults() {
        let event: HealthEvent = serde_json::from_value(json!({
            "id": "e1",
            "title": "Sprained ankle",
            "category": "injury",
            "createdAt": "2024-04-02T10:00:00Z",
            "updatedAt": "2024-04-02T10:00:00Z",
        }))
        .unwrap();

        assert_eq!(event.id.as_str(), "e1");
        assert_eq!(event.category, EventCategory::Injury);
        assert_eq!(event.severity, Severity::Low);
        assert!(event.attachments.is_empty());
        assert!(!event.is_resolved());
    }

    #[test]
    fn category_parses_case_insensitively() {
        let cat: EventCategory = "Medication".parse().unwrap();
        assert_eq!(cat, EventCategory::Medication);
        assert_eq!(cat.to_string(), "medication");
    }
}
