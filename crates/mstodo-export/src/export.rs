/*
[INPUT]:  Authenticated Graph client, output path, inclusion flags
[OUTPUT]: Todoist-import CSV file and exported row count
[POS]:    Orchestration layer - iterates lists and tasks, writes the file
[UPDATE]: When adding inclusion filters or changing the output format
*/

use std::path::Path;

use anyhow::{Context, Result};
use mstodo_adapter::GraphClient;
use tracing::info;

use crate::row::{map_task, TodoistRow, OUTPUT_HEADER};

/// Fallback name for lists the service returns without a display name
const UNNAMED_LIST: &str = "Unnamed List";

/// Inclusion filters for one export run
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Export tasks whose status is completed (default: excluded)
    pub include_completed: bool,
    /// Export unchecked checklist items as extra rows (default: on)
    pub include_checklists: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            include_completed: false,
            include_checklists: true,
        }
    }
}

/// Run one full export: fetch every list, fetch every list's tasks, map
/// them to rows, and write the CSV in one pass at the end.
///
/// Nothing is written until all lists have been processed; a failure
/// fetching any list aborts the run and discards accumulated rows.
/// Returns the number of data rows written (header excluded).
pub async fn run_export(
    client: &GraphClient,
    output_path: &Path,
    options: &ExportOptions,
) -> Result<usize> {
    let lists = client.list_task_lists().await.context("fetch task lists")?;
    info!(list_count = lists.len(), "fetched task lists");

    let mut rows: Vec<TodoistRow> = Vec::new();
    for list in &lists {
        let list_name = if list.display_name.is_empty() {
            UNNAMED_LIST
        } else {
            list.display_name.as_str()
        };

        let tasks = client
            .list_tasks(&list.id)
            .await
            .with_context(|| format!("fetch tasks for list '{list_name}'"))?;
        info!(list = %list_name, task_count = tasks.len(), "fetched tasks");

        for task in &tasks {
            if !options.include_completed && task.status.is_completed() {
                continue;
            }
            rows.extend(map_task(task, list_name, options.include_checklists, ""));
        }
    }

    write_csv(output_path, &rows)
        .with_context(|| format!("write output file {}", output_path.display()))?;
    info!(row_count = rows.len(), output = %output_path.display(), "export written");

    Ok(rows.len())
}

fn write_csv(output_path: &Path, rows: &[TodoistRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(output_path)?;
    writer.write_record(OUTPUT_HEADER)?;
    for row in rows {
        writer.write_record(row.record())?;
    }
    writer.flush()?;
    Ok(())
}
