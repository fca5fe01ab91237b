//! Health event command handlers.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tabled::Tabled;

use offsync_core::{Controller, HealthEvent, HealthEventFields, NewRecord, RecordChanges, RecordId};

use crate::cli::{CreateArgs, EventsArgs, EventsCommand, GlobalOpts, UpdateArgs};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct EventRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Severity")]
    severity: String,
    #[tabled(rename = "Created")]
    created: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Files")]
    files: usize,
}

impl From<&HealthEvent> for EventRow {
    fn from(e: &HealthEvent) -> Self {
        Self {
            id: e.id.to_string(),
            title: e.title.clone(),
            category: e.category.to_string(),
            severity: e.severity.to_string(),
            created: short_time(e.created_at),
            status: if e.is_resolved() { "resolved" } else { "open" }.into(),
            files: e.attachments.len(),
        }
    }
}

fn short_time(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}

fn detail(e: &HealthEvent) -> String {
    let mut lines = vec![
        format!("ID:          {}", e.id),
        format!("Title:       {}", e.title),
        format!("Category:    {}", e.category),
        format!("Severity:    {}", e.severity),
        format!("Created:     {}", short_time(e.created_at)),
        format!("Updated:     {}", short_time(e.updated_at)),
        format!(
            "Resolved:    {}",
            e.resolved_at.map_or_else(|| "-".into(), short_time)
        ),
    ];
    if !e.description.is_empty() {
        lines.push(format!("Description: {}", e.description));
    }
    for url in &e.attachments {
        lines.push(format!("Attachment:  {url}"));
    }
    lines.join("\n")
}

fn id_of(e: &HealthEvent) -> String {
    e.id.to_string()
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    controller: &Controller<HealthEvent>,
    args: EventsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        EventsCommand::List(filter) => {
            controller.apply_filters(util::filter_patch(&filter)?).await?;
            let state = controller.snapshot();
            if state.is_offline {
                output::notice(
                    "offline: showing cached results",
                    &global.color,
                    global.quiet,
                );
            }
            let out = output::render_list(
                &global.output,
                &state.records,
                |e| EventRow::from(e.as_ref()),
                |e| id_of(e),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        EventsCommand::Get { id } => {
            let event = find_event(controller, &id).await?;
            let out = output::render_single(&global.output, event.as_ref(), detail, id_of)?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        EventsCommand::Create(args) => {
            let input = build_new(args).await?;
            let event = controller.create_record(input).await?;
            let out = output::render_single(&global.output, &event, detail, id_of)?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        EventsCommand::Update(args) => {
            let existing = find_event(controller, &args.id).await?;
            let id = existing.id.clone();
            let changes = build_changes(&existing, args).await?;
            let event = controller.update_record(&id, changes).await?;
            let out = output::render_single(&global.output, &event, detail, id_of)?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        EventsCommand::Delete { id } => {
            controller.delete_record(&RecordId::new(id.clone())).await?;
            if !global.quiet {
                eprintln!("✓ Deleted event '{id}'");
            }
            Ok(())
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Resolve an event id via an unfiltered fetch (cached when offline).
async fn find_event(
    controller: &Controller<HealthEvent>,
    id: &str,
) -> Result<Arc<HealthEvent>, CliError> {
    controller.refresh().await?;
    controller
        .snapshot()
        .record(&RecordId::from(id))
        .cloned()
        .ok_or_else(|| CliError::NotFound {
            resource_type: "event".into(),
            identifier: id.into(),
            list_command: "events list".into(),
        })
}

async fn build_new(args: CreateArgs) -> Result<NewRecord<HealthEventFields>, CliError> {
    let mut fields = HealthEventFields::new(args.title, util::parse_category(&args.category)?);
    fields.severity = util::parse_severity(&args.severity)?;
    if let Some(description) = args.description {
        fields.description = description;
    }
    if args.resolved {
        fields.resolved_at = Some(Utc::now());
    }

    let mut input = NewRecord::new(fields);
    for path in &args.attachments {
        input = input.attach(util::read_attachment(path).await?);
    }
    Ok(input)
}

async fn build_changes(
    existing: &HealthEvent,
    args: UpdateArgs,
) -> Result<RecordChanges<HealthEventFields>, CliError> {
    let mut fields = HealthEventFields::from_event(existing);
    if let Some(title) = args.title {
        fields.title = title;
    }
    if let Some(ref raw) = args.category {
        fields.category = util::parse_category(raw)?;
    }
    if let Some(ref raw) = args.severity {
        fields.severity = util::parse_severity(raw)?;
    }
    if let Some(description) = args.description {
        fields.description = description;
    }
    if args.resolve {
        fields.resolved_at = Some(Utc::now());
    } else if args.reopen {
        fields.resolved_at = None;
    }

    let mut changes = RecordChanges::new(fields);
    for path in &args.attachments {
        changes = changes.attach(util::read_attachment(path).await?);
    }
    for url in args.detach {
        if !existing.attachments.contains(&url) {
            return Err(CliError::Validation {
                field: "detach".into(),
                reason: format!("'{url}' is not attached to event '{}'", existing.id),
            });
        }
        changes = changes.detach(url);
    }
    Ok(changes)
}
