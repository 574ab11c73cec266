//! Request actions, validated once at the HTTP boundary.

use crate::error::{TaskError, TaskResult};
use crate::types::TaskStatus;
use crate::validation::{
    normalize_action, parse_task_ids, validate_description, validate_id, validate_order,
    validate_status, validate_title,
};
use std::collections::HashMap;

/// The closed set of operations the single endpoint accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    List,
    Create,
    Update,
    Delete,
    Toggle,
    Reorder,
    Move,
}

impl ActionKind {
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match normalize_action(raw)?.as_str() {
            "list" => Some(ActionKind::List),
            "create" => Some(ActionKind::Create),
            "update" => Some(ActionKind::Update),
            "delete" => Some(ActionKind::Delete),
            "toggle" => Some(ActionKind::Toggle),
            "reorder" => Some(ActionKind::Reorder),
            "move" => Some(ActionKind::Move),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::List => "list",
            ActionKind::Create => "create",
            ActionKind::Update => "update",
            ActionKind::Delete => "delete",
            ActionKind::Toggle => "toggle",
            ActionKind::Reorder => "reorder",
            ActionKind::Move => "move",
        }
    }

    pub fn is_mutating(&self) -> bool {
        !matches!(self, ActionKind::List)
    }
}

/// A validated action with its sanitized fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    List,
    Create {
        title: String,
        description: String,
    },
    Update {
        id: i64,
        title: String,
        description: String,
    },
    Delete {
        id: i64,
    },
    Toggle {
        id: i64,
    },
    Reorder {
        task_ids: Vec<i64>,
        status: TaskStatus,
    },
    Move {
        id: i64,
        order: i64,
        status: Option<TaskStatus>,
    },
}

fn required_id(fields: &HashMap<String, String>) -> TaskResult<i64> {
    validate_id(field(fields, "id")).ok_or_else(|| TaskError::invalid_value("id", "Invalid task ID"))
}

fn field<'a>(fields: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    fields.get(name).map(String::as_str)
}

impl Action {
    /// Validate the form fields for `kind`.
    pub fn from_fields(kind: ActionKind, fields: &HashMap<String, String>) -> TaskResult<Self> {
        let action = match kind {
            ActionKind::List => Action::List,
            ActionKind::Create => Action::Create {
                title: validate_title(field(fields, "title"))?,
                description: validate_description(field(fields, "description"))?,
            },
            ActionKind::Update => Action::Update {
                id: required_id(fields)?,
                title: validate_title(field(fields, "title"))?,
                description: validate_description(field(fields, "description"))?,
            },
            ActionKind::Delete => Action::Delete {
                id: required_id(fields)?,
            },
            ActionKind::Toggle => Action::Toggle {
                id: required_id(fields)?,
            },
            ActionKind::Reorder => Action::Reorder {
                task_ids: parse_task_ids(field(fields, "task_ids"))?,
                status: validate_status(field(fields, "status"))
                    .ok_or_else(|| TaskError::invalid_value("status", "Invalid status"))?,
            },
            ActionKind::Move => {
                let id = required_id(fields)?;
                let order = validate_order(field(fields, "order"))
                    .ok_or_else(|| TaskError::invalid_value("order", "Invalid position"))?;
                let status = match field(fields, "status").map(str::trim) {
                    None | Some("") => None,
                    Some(raw) => Some(
                        validate_status(Some(raw))
                            .ok_or_else(|| TaskError::invalid_value("status", "Invalid status"))?,
                    ),
                };
                Action::Move { id, order, status }
            }
        };
        Ok(action)
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Action::List => ActionKind::List,
            Action::Create { .. } => ActionKind::Create,
            Action::Update { .. } => ActionKind::Update,
            Action::Delete { .. } => ActionKind::Delete,
            Action::Toggle { .. } => ActionKind::Toggle,
            Action::Reorder { .. } => ActionKind::Reorder,
            Action::Move { .. } => ActionKind::Move,
        }
    }

    pub fn is_mutating(&self) -> bool {
        self.kind().is_mutating()
    }
}
