//! Shared helpers for command handlers.

use std::collections::BTreeSet;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use offsync_core::{Attachment, DateRange, EventCategory, FilterPatch, FilterSpec, Severity};

use crate::cli::FilterArgs;
use crate::error::CliError;

/// Parse `YYYY-MM-DD` (start or end of that UTC day) or a full RFC 3339
/// timestamp.
pub fn parse_date(field: &str, raw: &str, end_of_day: bool) -> Result<DateTime<Utc>, CliError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| CliError::Validation {
        field: field.into(),
        reason: format!("expected YYYY-MM-DD or an RFC 3339 timestamp, got '{raw}'"),
    })?;
    let time = if end_of_day {
        NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
    } else {
        NaiveTime::from_hms_opt(0, 0, 0)
    };
    let time = time.ok_or_else(|| CliError::Internal("invalid time of day".into()))?;
    Ok(date.and_time(time).and_utc())
}

pub fn parse_category(raw: &str) -> Result<EventCategory, CliError> {
    EventCategory::from_str(raw).map_err(|_| CliError::Validation {
        field: "category".into(),
        reason: format!(
            "unknown category '{raw}'. Valid: symptom, medication, appointment, \
             measurement, injury, other"
        ),
    })
}

pub fn parse_severity(raw: &str) -> Result<Severity, CliError> {
    Severity::from_str(raw).map_err(|_| CliError::Validation {
        field: "severity".into(),
        reason: format!("unknown severity '{raw}'. Valid: low, medium, high"),
    })
}

/// Only the restrictions actually given on the command line.
pub fn filter_patch(args: &FilterArgs) -> Result<FilterPatch, CliError> {
    let mut patch = FilterPatch::default();

    if args.from.is_some() || args.to.is_some() {
        let from = args
            .from
            .as_deref()
            .map(|raw| parse_date("from", raw, false))
            .transpose()?;
        let to = args
            .to
            .as_deref()
            .map(|raw| parse_date("to", raw, true))
            .transpose()?;
        if let (Some(from), Some(to)) = (from, to) {
            if from > to {
                return Err(CliError::Validation {
                    field: "from".into(),
                    reason: "start date is after end date".into(),
                });
            }
        }
        patch.date_range = Some(DateRange { from, to });
    }

    if !args.categories.is_empty() {
        let categories: BTreeSet<String> = args
            .categories
            .iter()
            .map(|raw| parse_category(raw).map(|c| c.to_string()))
            .collect::<Result<_, CliError>>()?;
        patch.categories = Some(categories);
    }

    if args.resolved {
        patch.resolved = Some(Some(true));
    } else if args.unresolved {
        patch.resolved = Some(Some(false));
    }

    if let Some(ref query) = args.query {
        patch.query = Some(Some(query.clone()));
    }

    Ok(patch)
}

/// The full filter described by the command line.
pub fn filter_spec(args: &FilterArgs) -> Result<FilterSpec, CliError> {
    Ok(FilterSpec::all().merged(filter_patch(args)?))
}

/// Load a file from disk as an attachment named after the file.
pub async fn read_attachment(path: &Path) -> Result<Attachment, CliError> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| CliError::Validation {
            field: "attach".into(),
            reason: format!("'{}' has no usable file name", path.display()),
        })?
        .to_owned();
    let bytes = tokio::fs::read(path).await?;

    let attachment = Attachment::new(name, bytes);
    Ok(match content_type(path) {
        Some(ct) => attachment.with_content_type(ct),
        None => attachment,
    })
}

fn content_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    Some(match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "heic" => "image/heic",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "json" => "application/json",
        _ => return None,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn bare_dates_cover_the_whole_day() {
        let from = parse_date("from", "2024-03-01", false).unwrap();
        let to = parse_date("to", "2024-03-01", true).unwrap();
        assert_eq!(from.to_rfc3339(), "2024-03-01T00:00:00+00:00");
        assert_eq!(to.timestamp_subsec_millis(), 999);
        assert!(to > from);
    }

    #[test]
    fn rfc3339_is_normalized_to_utc() {
        let ts = parse_date("from", "2024-03-01T10:00:00+02:00", false).unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-03-01T08:00:00+00:00");
    }

    #[test]
    fn categories_are_canonicalized() {
        let args = FilterArgs {
            categories: vec!["Symptom".into(), "INJURY".into()],
            unresolved: true,
            ..FilterArgs::default()
        };
        let spec = filter_spec(&args).unwrap();
        assert_eq!(
            spec.categories.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["injury", "symptom"]
        );
        assert_eq!(spec.resolved, Some(false));
    }

    #[test]
    fn unknown_category_is_rejected() {
        let args = FilterArgs {
            categories: vec!["mood".into()],
            ..FilterArgs::default()
        };
        assert!(matches!(
            filter_patch(&args),
            Err(CliError::Validation { .. })
        ));
    }

    #[test]
    fn inverted_date_range_is_rejected() {
        let args = FilterArgs {
            from: Some("2024-05-02".into()),
            to: Some("2024-05-01".into()),
            ..FilterArgs::default()
        };
        assert!(filter_patch(&args).is_err());
    }

    #[test]
    fn no_flags_means_no_restrictions() {
        assert_eq!(filter_patch(&FilterArgs::default()).unwrap(), FilterPatch::default());
    }
}
