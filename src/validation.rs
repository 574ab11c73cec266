//! Input sanitization and bounds checks for request fields.
//!
//! Values are stored as plain text. HTML escaping is the renderer's job, so
//! nothing here produces entities.

use crate::error::{TaskError, TaskResult};
use crate::types::TaskStatus;
use regex_lite::Regex;
use serde_json::Value;
use std::sync::LazyLock;

pub const MAX_TITLE_LENGTH: usize = 255;
pub const MAX_DESCRIPTION_LENGTH: usize = 1000;
pub const MAX_ACTION_LENGTH: usize = 50;

static TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<[^>]*>").expect("tag pattern is a valid regex")
});

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Trim, drop NUL bytes and HTML tags, then cap at `max_len` characters.
///
/// Returns `None` when nothing is left.
pub fn sanitize_text(input: &str, max_len: usize) -> Option<String> {
    let cleaned = input.replace('\0', "");
    let cleaned = TAG_PATTERN.replace_all(cleaned.trim(), "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    Some(truncate_chars(cleaned, max_len))
}

/// Validate and sanitize a task title.
pub fn validate_title(input: Option<&str>) -> TaskResult<String> {
    let title = input.map(str::trim).unwrap_or_default();

    if title.is_empty() {
        return Err(TaskError::missing_field("title"));
    }
    if char_len(title) > MAX_TITLE_LENGTH {
        return Err(TaskError::invalid_value(
            "title",
            format!("Title cannot exceed {} characters", MAX_TITLE_LENGTH),
        ));
    }
    if TAG_PATTERN.is_match(title) {
        return Err(TaskError::invalid_value(
            "title",
            "Title contains invalid characters",
        ));
    }

    sanitize_text(title, MAX_TITLE_LENGTH).ok_or_else(|| TaskError::missing_field("title"))
}

/// Validate and sanitize an optional description. Empty is allowed.
pub fn validate_description(input: Option<&str>) -> TaskResult<String> {
    let description = input.map(str::trim).unwrap_or_default();

    if char_len(description) > MAX_DESCRIPTION_LENGTH {
        return Err(TaskError::invalid_value(
            "description",
            format!(
                "Description cannot exceed {} characters",
                MAX_DESCRIPTION_LENGTH
            ),
        ));
    }

    Ok(sanitize_text(description, MAX_DESCRIPTION_LENGTH).unwrap_or_default())
}

/// A strictly positive integer id, or `None`.
pub fn validate_id(input: Option<&str>) -> Option<i64> {
    input?.trim().parse::<i64>().ok().filter(|id| *id > 0)
}

/// `pending` or `completed`, case-insensitive.
pub fn validate_status(input: Option<&str>) -> Option<TaskStatus> {
    TaskStatus::parse(input?)
}

/// A non-negative position within a column.
pub fn validate_order(input: Option<&str>) -> Option<i64> {
    input?.trim().parse::<i64>().ok().filter(|order| *order >= 0)
}

/// The raw action name: lowercased, bounded, or `None` if absent or oversized.
pub fn normalize_action(input: Option<&str>) -> Option<String> {
    let action = input?.trim();
    if action.is_empty() || char_len(action) > MAX_ACTION_LENGTH {
        return None;
    }
    Some(action.to_lowercase())
}

/// Parse a JSON array of task ids. Elements may be integers or numeric
/// strings; every element must be a positive id.
pub fn parse_task_ids(input: Option<&str>) -> TaskResult<Vec<i64>> {
    let raw = input
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| TaskError::missing_field("task_ids"))?;

    let invalid = || TaskError::invalid_value("task_ids", "Invalid task list");

    let values: Vec<Value> = serde_json::from_str(raw).map_err(|_| invalid())?;
    values
        .iter()
        .map(|value| match value {
            Value::Number(n) => n.as_i64().filter(|id| *id > 0).ok_or_else(invalid),
            Value::String(s) => validate_id(Some(s)).ok_or_else(invalid),
            _ => Err(invalid()),
        })
        .collect()
}
