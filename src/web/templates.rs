//! HTML templates and rendering for the task board.
//!
//! Templates are embedded at compile time using `include_str!` and filled by
//! plain `{{placeholder}}` substitution. Every user-supplied string goes
//! through `html_escape` before it is substituted.

use crate::config::DateConfig;
use crate::format::{format_timestamp, html_escape};
use crate::types::{Task, TaskBoard, TaskStatus};
use chrono_tz::Tz;

/// The task board page.
pub const INDEX_TEMPLATE: &str = include_str!("templates/index.html");

/// The generic error page.
pub const ERROR_TEMPLATE: &str = include_str!("templates/error.html");

/// Client script for drag-and-drop ordering.
pub const APP_JS: &str = include_str!("static/app.js");

/// Stylesheet.
pub const STYLE_CSS: &str = include_str!("static/style.css");

fn token_input(token: &str) -> String {
    format!(
        r#"<input type="hidden" name="csrf_token" value="{}">"#,
        html_escape(token)
    )
}

fn render_task(task: &Task, token: &str, date_format: &str, tz: Tz) -> String {
    let status = task.status;
    let toggle_title = match status {
        TaskStatus::Pending => "Mark as completed",
        TaskStatus::Completed => "Mark as pending",
    };
    let description = if task.description.is_empty() {
        String::new()
    } else {
        format!(
            r#"<p class="task-description">{}</p>"#,
            html_escape(&task.description)
        )
    };
    let token_input = token_input(token);
    let title = html_escape(&task.title);

    format!(
        r#"<div class="task-item task-{status}" data-id="{id}" data-order="{order}" draggable="true">
    <span class="drag-handle" title="Drag to move">&#8942;&#8942;</span>
    <form method="POST" action="/?action=toggle" class="task-form-inline">
        {token_input}
        <input type="hidden" name="id" value="{id}">
        <button type="submit" class="task-checkbox" title="{toggle_title}"></button>
    </form>
    <div class="task-content">
        <h4 class="task-title">{title}</h4>
        {description}
        <small class="task-date">Created: {created}</small>
        <details class="task-edit">
            <summary>Edit</summary>
            <form method="POST" action="/?action=update">
                {token_input}
                <input type="hidden" name="id" value="{id}">
                <input type="text" name="title" value="{title}" class="form-input" maxlength="255" required>
                <textarea name="description" class="form-textarea" maxlength="1000" rows="2">{raw_description}</textarea>
                <button type="submit" class="btn btn-primary">Save</button>
            </form>
        </details>
    </div>
    <span class="task-badge badge-{status}">{label}</span>
    <form method="POST" action="/?action=delete" class="task-delete">
        {token_input}
        <input type="hidden" name="id" value="{id}">
        <button type="submit" class="btn-delete" title="Delete">&#10005;</button>
    </form>
</div>"#,
        status = status.as_str(),
        id = task.id,
        order = task.task_order,
        created = html_escape(&format_timestamp(task.created_at, date_format, tz)),
        raw_description = html_escape(&task.description),
        label = status.label(),
    )
}

fn render_column(
    board: &TaskBoard,
    status: TaskStatus,
    token: &str,
    date_format: &str,
    tz: Tz,
) -> String {
    let tasks = board.column(status);
    if tasks.is_empty() {
        let text = match status {
            TaskStatus::Pending => "No pending tasks. Great job!",
            TaskStatus::Completed => "No completed tasks yet.",
        };
        return format!(r#"<p class="empty-state">{}</p>"#, text);
    }

    tasks
        .iter()
        .map(|task| render_task(task, token, date_format, tz))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_messages(board: &TaskBoard) -> String {
    board
        .messages
        .iter()
        .map(|message| {
            format!(
                r#"<div class="alert alert-{}">{}</div>"#,
                message.kind.as_str(),
                html_escape(&message.text)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render the full board page.
pub fn render_board(board: &TaskBoard, token: &str, date: &DateConfig) -> String {
    let tz = date.tz();
    INDEX_TEMPLATE
        .replace("{{stats_total}}", &board.stats.total.to_string())
        .replace("{{stats_completed}}", &board.stats.completed.to_string())
        .replace("{{stats_pending}}", &board.stats.pending.to_string())
        .replace("{{messages}}", &render_messages(board))
        .replace(
            "{{pending_tasks}}",
            &render_column(board, TaskStatus::Pending, token, &date.format, tz),
        )
        .replace(
            "{{completed_tasks}}",
            &render_column(board, TaskStatus::Completed, token, &date.format, tz),
        )
        .replace("{{csrf_token}}", &html_escape(token))
}

/// Render the error page, with details only when given.
pub fn render_error(detail: Option<&str>) -> String {
    let detail = detail
        .map(|d| format!(r#"<div class="error-code">{}</div>"#, html_escape(d)))
        .unwrap_or_default();
    ERROR_TEMPLATE.replace("{{detail}}", &detail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Message, TaskStats};

    fn date(format: &str, timezone: &str) -> DateConfig {
        DateConfig {
            format: format.to_string(),
            timezone: timezone.to_string(),
        }
    }

    fn task(id: i64, title: &str, status: TaskStatus) -> Task {
        Task {
            id,
            title: title.to_string(),
            description: String::new(),
            status,
            task_order: 0,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn board_escapes_user_text() {
        let board = TaskBoard {
            pending: vec![task(1, "<b>bold</b> & co", TaskStatus::Pending)],
            completed: vec![],
            stats: TaskStats {
                total: 1,
                completed: 0,
                pending: 1,
            },
            messages: vec![Message::error("<oops>")],
        };
        let html = render_board(&board, "tok", &date("%Y", "UTC"));

        assert!(html.contains("&lt;b&gt;bold&lt;/b&gt; &amp; co"));
        assert!(!html.contains("<b>bold</b>"));
        assert!(html.contains(r#"<div class="alert alert-error">&lt;oops&gt;</div>"#));
        assert!(html.contains("No completed tasks yet."));
        assert!(html.contains(r#"data-id="1""#));
    }

    #[test]
    fn every_form_carries_the_token() {
        let board = TaskBoard {
            pending: vec![task(1, "a", TaskStatus::Pending)],
            completed: vec![task(2, "b", TaskStatus::Completed)],
            ..TaskBoard::default()
        };
        let html = render_board(&board, "secret-token", &date("%Y", "UTC"));
        let forms = html.matches("<form").count();
        let tokens = html.matches(r#"name="csrf_token" value="secret-token""#).count();

        // 1 create form + 3 per task, plus one hidden input per column
        assert_eq!(forms, 7);
        assert_eq!(tokens, forms + 2);
        assert!(!html.contains("{{"));
    }

    #[test]
    fn dates_use_the_configured_zone() {
        let mut created = task(1, "a", TaskStatus::Pending);
        // 2024-03-05T14:07:00Z
        created.created_at = 1_709_647_620_000;
        let board = TaskBoard {
            pending: vec![created],
            ..TaskBoard::default()
        };

        let html = render_board(&board, "tok", &date("%H:%M", "America/New_York"));
        assert!(html.contains("Created: 09:07"));

        let html = render_board(&board, "tok", &date("%H:%M", "UTC"));
        assert!(html.contains("Created: 14:07"));
    }

    #[test]
    fn error_page_hides_detail_by_default() {
        assert!(!render_error(None).contains("error-code"));
        let html = render_error(Some("no such table: tasks"));
        assert!(html.contains("no such table: tasks"));
    }
}
