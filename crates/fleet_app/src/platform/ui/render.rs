//! Plain-text rendering of the console view model.

use std::fmt::Write as _;

use chrono::{DateTime, Local};
use fleet_core::{
    selected_visible, Action, AppViewModel, BatchProgress, BulkResult, BulkSummary,
    CategorizedError, EntityRowView, SchedulerPhase,
};

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";
const HEADERS: [&str; 6] = ["NAME", "STATE", "TASKS", "PLUGIN", "TOPICS", "WORKER"];

pub struct RenderContext<'a> {
    pub cluster: &'a str,
    pub last_refreshed: Option<DateTime<Local>>,
}

/// Whether anything other than the countdown changed since the last frame.
pub fn needs_redraw(previous: Option<&AppViewModel>, next: &AppViewModel) -> bool {
    let Some(previous) = previous else {
        return true;
    };
    let strip = |view: &AppViewModel| {
        let mut view = view.clone();
        view.scheduler.remaining_secs = None;
        view.dirty = false;
        view
    };
    strip(previous) != strip(next)
}

pub fn print_frame(view: &AppViewModel, context: &RenderContext<'_>) {
    print!("{CLEAR_SCREEN}{}", render(view, context));
}

pub fn render(view: &AppViewModel, context: &RenderContext<'_>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", status_line(view, context));

    if let Some(banner) = &view.banner {
        out.push('\n');
        out.push_str(&render_error(banner));
    }

    out.push('\n');
    if view.rows.is_empty() {
        if view.total_entities == 0 {
            out.push_str("No connectors.\n");
        } else {
            out.push_str("No connectors match the current filters.\n");
        }
    } else {
        out.push_str(&render_table(&view.rows));
    }

    let mut filters = Vec::new();
    if !view.filters.search.trim().is_empty() {
        filters.push(format!("search \"{}\"", view.filters.search.trim()));
    }
    if let Some(state) = view.filters.state {
        filters.push(format!("state {}", state.label()));
    }
    let _ = writeln!(
        out,
        "\n{} of {} shown{}",
        view.rows.len(),
        view.total_entities,
        if filters.is_empty() {
            String::new()
        } else {
            format!(" ({})", filters.join(", "))
        }
    );

    let visible_selected = selected_visible(&view.rows);
    if view.selected_count > 0 {
        let actions: Vec<&str> = Action::ALL.iter().map(|action| action.label()).collect();
        let _ = writeln!(
            out,
            "{} selected ({} visible): {}",
            view.selected_count,
            visible_selected.len(),
            actions.join(" | ")
        );
    }

    for row in view.rows.iter().filter(|row| row.error.is_some()) {
        if let Some(error) = &row.error {
            let hint = if row.retrying {
                " [retrying...]"
            } else if row.can_retry() {
                " [retry available]"
            } else {
                ""
            };
            let _ = writeln!(out, "! {}: {}{}", row.name, error.message, hint);
        }
    }

    if let Some(action) = view.bulk_in_flight {
        let _ = writeln!(out, "\n{} in progress...", action.label());
    }
    if let Some(report) = &view.last_bulk {
        out.push('\n');
        out.push_str(&render_bulk(report.action, &report.result));
    }
    if let Some(pending) = &view.pending {
        let _ = writeln!(
            out,
            "\n{} {} connector(s): {}? Type `yes` to confirm or `no` to cancel.",
            pending.action.label(),
            pending.names.len(),
            pending.names.join(", ")
        );
    }

    out.push_str("\n> ");
    out
}

fn status_line(view: &AppViewModel, context: &RenderContext<'_>) -> String {
    let mut parts = vec![format!("cluster {}", context.cluster)];

    let scheduler = &view.scheduler;
    parts.push(match scheduler.phase {
        SchedulerPhase::Fetching => match view.progress {
            Some(progress) => format!("refreshing {}", progress_label(progress)),
            None => "refreshing".to_string(),
        },
        SchedulerPhase::Counting => match scheduler.remaining_secs {
            Some(secs) => format!("next refresh in {secs}s"),
            None => "auto refresh on".to_string(),
        },
        SchedulerPhase::Paused if !scheduler.auto_refresh => "auto refresh off".to_string(),
        SchedulerPhase::Paused => "auto refresh paused".to_string(),
        SchedulerPhase::Idle => "idle".to_string(),
    });
    if scheduler.queued {
        parts.push("refresh queued".to_string());
    }
    if let Some(at) = context.last_refreshed {
        parts.push(format!("updated {}", at.format("%H:%M:%S")));
    }
    parts.join(" | ")
}

fn progress_label(progress: BatchProgress) -> String {
    format!("{}/{}", progress.completed, progress.total)
}

pub fn render_error(error: &CategorizedError) -> String {
    let mut out = format!("Error: {}\n", error.message);
    if let Some(status) = error.http_status {
        let _ = writeln!(out, "  status: {status}");
    }
    for tip in error.troubleshooting {
        let _ = writeln!(out, "  - {tip}");
    }
    if error.retryable {
        out.push_str("  This may be temporary; the next refresh will try again.\n");
    }
    out
}

pub fn render_table(rows: &[EntityRowView]) -> String {
    let cells: Vec<[String; 6]> = rows.iter().map(row_cells).collect();
    let mut widths = HEADERS.map(str::len);
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header = HEADERS.map(str::to_string);
    push_line(&mut out, "   ", &header, &widths);
    for (row, cells) in rows.iter().zip(&cells) {
        let marker = if row.selected { "[x]" } else { "[ ]" };
        push_line(&mut out, marker, cells, &widths);
    }
    out
}

fn push_line(out: &mut String, marker: &str, cells: &[String; 6], widths: &[usize; 6]) {
    let mut line = marker.to_string();
    for (cell, width) in cells.iter().zip(widths) {
        let _ = write!(line, " {cell:<width$}");
    }
    out.push_str(line.trim_end());
    out.push('\n');
}

fn row_cells(row: &EntityRowView) -> [String; 6] {
    let tasks = if row.error.is_some() {
        "-".to_string()
    } else if row.task_counts.failed > 0 {
        format!(
            "{}/{} ({} failed)",
            row.task_counts.running, row.task_counts.total, row.task_counts.failed
        )
    } else {
        format!("{}/{}", row.task_counts.running, row.task_counts.total)
    };
    [
        row.name.clone(),
        row.state.label().to_string(),
        tasks,
        row.plugin
            .as_deref()
            .map(short_class_name)
            .unwrap_or("-")
            .to_string(),
        if row.topics.is_empty() {
            "-".to_string()
        } else {
            row.topics.join(",")
        },
        row.worker_id.clone().unwrap_or_else(|| "-".to_string()),
    ]
}

/// `io.confluent.connect.s3.S3SinkConnector` -> `S3SinkConnector`
fn short_class_name(class_name: &str) -> &str {
    class_name.rsplit('.').next().unwrap_or(class_name)
}

pub fn render_bulk(action: Action, result: &BulkResult) -> String {
    let mut out = String::new();
    match result.summary() {
        BulkSummary::AllSucceeded => {
            let _ = writeln!(
                out,
                "{} succeeded for all {} connector(s).",
                action.label(),
                result.successes.len()
            );
        }
        BulkSummary::PartialSuccess => {
            let _ = writeln!(
                out,
                "{} partially succeeded: {} of {} connector(s).",
                action.label(),
                result.successes.len(),
                result.attempted()
            );
        }
        BulkSummary::AllFailed => {
            let _ = writeln!(
                out,
                "{} failed for all {} connector(s).",
                action.label(),
                result.failures.len()
            );
        }
    }
    for failure in &result.failures {
        let _ = writeln!(out, "  x {}: {}", failure.name, failure.error);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_core::{BulkFailure, EntityState, ErrorKind, TaskCounts};
    use pretty_assertions::assert_eq;

    fn row(name: &str) -> EntityRowView {
        EntityRowView {
            name: name.to_string(),
            state: EntityState::Running,
            task_counts: TaskCounts {
                total: 2,
                running: 2,
                failed: 0,
            },
            plugin: Some("io.example.connect.S3SinkConnector".to_string()),
            topics: vec!["orders".to_string()],
            worker_id: Some("w1:8083".to_string()),
            selected: false,
            error: None,
            retrying: false,
        }
    }

    #[test]
    fn table_aligns_columns_and_marks_selection() {
        let mut selected = row("beta-long-name");
        selected.selected = true;
        let table = render_table(&[row("alpha"), selected]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("    NAME"));
        assert!(lines[1].starts_with("[ ] alpha          RUNNING"));
        assert!(lines[2].starts_with("[x] beta-long-name RUNNING"));
        assert!(lines[1].contains("S3SinkConnector"));
    }

    #[test]
    fn failed_row_shows_no_task_counts() {
        let mut failed = row("gamma");
        failed.error = Some(CategorizedError::new(
            ErrorKind::Timeout,
            "Request timed out",
            "aborted",
        ));
        assert_eq!(row_cells(&failed)[2], "-");
    }

    #[test]
    fn bulk_report_distinguishes_outcomes() {
        let all = BulkResult {
            successes: vec!["a".to_string(), "b".to_string()],
            failures: Vec::new(),
        };
        assert_eq!(
            render_bulk(Action::Pause, &all),
            "pause succeeded for all 2 connector(s).\n"
        );

        let partial = BulkResult {
            successes: vec!["alpha".to_string()],
            failures: vec![BulkFailure {
                name: "beta".to_string(),
                error: "already paused".to_string(),
            }],
        };
        let text = render_bulk(Action::Pause, &partial);
        assert!(text.contains("partially succeeded: 1 of 2"));
        assert!(text.contains("x beta: already paused"));

        let failed = BulkResult {
            successes: Vec::new(),
            failures: partial.failures.clone(),
        };
        assert!(render_bulk(Action::Pause, &failed).contains("failed for all 1"));
    }

    #[test]
    fn error_lists_troubleshooting_steps() {
        let error = CategorizedError::new(
            ErrorKind::HttpError { status: 503 },
            "HTTP 503: Service Unavailable",
            "503",
        );
        let text = render_error(&error);
        assert!(text.starts_with("Error: HTTP 503: Service Unavailable\n  status: 503\n"));
        assert_eq!(
            text.lines().filter(|line| line.starts_with("  - ")).count(),
            error.troubleshooting.len()
        );
    }

    #[test]
    fn short_class_name_keeps_last_segment() {
        assert_eq!(short_class_name("a.b.C"), "C");
        assert_eq!(short_class_name("Plain"), "Plain");
    }
}
