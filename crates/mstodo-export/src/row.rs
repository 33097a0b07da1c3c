/*
[INPUT]:  One task record with its checklist items and source list name
[OUTPUT]: Flat Todoist-import rows (Type,Content,Priority,Due Date,Due Time,Description)
[POS]:    Mapping layer - pure conversion, no I/O
[UPDATE]: When the Todoist import format or field mapping changes
*/

use chrono::{DateTime, NaiveDateTime, NaiveTime};
use mstodo_adapter::{DateTimeTimeZone, Importance, TodoTask};

/// Fixed header of the Todoist import CSV
pub const OUTPUT_HEADER: [&str; 6] = [
    "Type",
    "Content",
    "Priority",
    "Due Date",
    "Due Time",
    "Description",
];

/// Every exported row carries the literal `task` type marker
pub const ROW_TYPE: &str = "task";

const HAS_ATTACHMENTS_MARKER: &str = "[Has Attachments]";
const DESCRIPTION_SEPARATOR: &str = " \n";

/// One Todoist-importable row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoistRow {
    pub content: String,
    pub priority: u8,
    pub due_date: String,
    pub due_time: String,
    pub description: String,
}

impl TodoistRow {
    /// Render the row as the fixed 6-tuple written to the CSV
    pub fn record(&self) -> [String; 6] {
        [
            ROW_TYPE.to_string(),
            self.content.clone(),
            self.priority.to_string(),
            self.due_date.clone(),
            self.due_time.clone(),
            self.description.clone(),
        ]
    }
}

/// Collapse each run of carriage returns/newlines to a single space and
/// trim outer whitespace.
pub fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_line_break = false;
    for ch in text.chars() {
        if ch == '\r' || ch == '\n' {
            if !in_line_break {
                out.push(' ');
                in_line_break = true;
            }
        } else {
            out.push(ch);
            in_line_break = false;
        }
    }
    out.trim().to_string()
}

/// Map To Do importance to a Todoist priority number.
///
/// high -> 1 (highest), normal -> 3, low -> 4 (lowest). Unknown wire
/// values already read as normal at deserialization.
pub fn importance_priority(importance: Importance) -> u8 {
    match importance {
        Importance::High => 1,
        Importance::Normal => 3,
        Importance::Low => 4,
    }
}

/// Split a due timestamp into calendar date and clock time.
///
/// Exact midnight is indistinguishable from "date-only" in the source
/// data, so it reads as no time. Absent or unparsable input yields both
/// fields empty; parse failures are swallowed.
pub fn split_due(due: Option<&DateTimeTimeZone>) -> (String, String) {
    let Some(due) = due else {
        return (String::new(), String::new());
    };
    let Some(parsed) = parse_wall_clock(&due.date_time) else {
        return (String::new(), String::new());
    };

    let date = parsed.format("%Y-%m-%d").to_string();
    let time = if parsed.time() == NaiveTime::MIN {
        String::new()
    } else {
        parsed.format("%H:%M").to_string()
    };
    (date, time)
}

/// Graph serializes due timestamps either with an offset (`...T09:30:00Z`)
/// or as a bare wall-clock value with the zone in a sibling field. The
/// wall clock is kept as written, never converted.
fn parse_wall_clock(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.naive_local());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok()
}

/// Convert one task (and optionally its checklist items) into output rows.
///
/// The task itself always yields one row with content
/// `parent_prefix + title`. With `include_checklists`, every unchecked
/// checklist item yields one extra row; checked items are skipped
/// unconditionally, independent of any completed-task setting.
pub fn map_task(
    task: &TodoTask,
    list_name: &str,
    include_checklists: bool,
    parent_prefix: &str,
) -> Vec<TodoistRow> {
    let title = sanitize(&task.title);
    let priority = importance_priority(task.importance);
    let (due_date, due_time) = split_due(task.due_date_time.as_ref());

    let mut notes = Vec::new();
    let body = task
        .body
        .as_ref()
        .map(|body| sanitize(&body.content))
        .unwrap_or_default();
    if !body.is_empty() {
        notes.push(body);
    }
    if task.has_attachments {
        notes.push(HAS_ATTACHMENTS_MARKER.to_string());
    }
    notes.push(format!("List: {list_name}"));
    let description = notes.join(DESCRIPTION_SEPARATOR);

    let mut rows = vec![TodoistRow {
        content: format!("{parent_prefix}{title}"),
        priority,
        due_date: due_date.clone(),
        due_time: due_time.clone(),
        description,
    }];

    if include_checklists {
        for item in &task.checklist_items {
            if item.is_checked {
                continue;
            }
            let item_title = sanitize(&item.display_name);
            rows.push(TodoistRow {
                content: format!("{title} > {item_title}"),
                priority,
                due_date: due_date.clone(),
                due_time: due_time.clone(),
                description: format!("Subtask from '{title}' | List: {list_name}"),
            });
        }
    }

    rows
}
