//! Task use cases on top of the store and ordering engine.
//!
//! A `TaskService` lives for one request. Each operation appends a message and
//! returns a freshly loaded board; nothing carries over between requests.

use crate::db::Database;
use crate::error::TaskError;
use crate::types::{Message, TaskBoard, TaskStatus};
use anyhow::Result;
use tracing::{debug, info};

pub struct TaskService<'a> {
    db: &'a Database,
    messages: Vec<Message>,
}

impl<'a> TaskService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            messages: Vec::new(),
        }
    }

    /// Messages accumulated so far in this request.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Add a message that did not come from a service operation, such as a
    /// rejected form at the request boundary.
    pub fn push_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Load both columns, counts, and the messages collected so far.
    pub fn list(&self) -> Result<TaskBoard> {
        let tasks = self.db.get_all_tasks()?;
        let (pending, completed): (Vec<_>, Vec<_>) = tasks
            .into_iter()
            .partition(|task| task.status == TaskStatus::Pending);

        Ok(TaskBoard {
            pending,
            completed,
            stats: self.db.get_stats()?,
            messages: self.messages.clone(),
        })
    }

    pub fn create(&mut self, title: &str, description: &str) -> Result<TaskBoard> {
        match self.db.create_task(title, description, TaskStatus::Pending) {
            Ok(id) => {
                info!(task_id = id, "Task created");
                self.success("Task created successfully!");
            }
            Err(e) => self.absorb(e)?,
        }
        self.list()
    }

    pub fn update(&mut self, task_id: i64, title: &str, description: &str) -> Result<TaskBoard> {
        match self.db.update_task(task_id, title, description, None) {
            Ok(true) => {
                info!(task_id, "Task updated");
                self.success("Task updated!");
            }
            Ok(false) => self.not_found(task_id),
            Err(e) => self.absorb(e)?,
        }
        self.list()
    }

    /// Flip pending <-> completed. `task_order` is left as it was.
    pub fn toggle_status(&mut self, task_id: i64) -> Result<TaskBoard> {
        let Some(task) = self.db.get_task(task_id)? else {
            self.not_found(task_id);
            return self.list();
        };

        let status = task.status.toggled();
        match self
            .db
            .update_task(task_id, &task.title, &task.description, Some(status))
        {
            Ok(true) => {
                info!(task_id, status = %status, "Task status toggled");
                self.success("Status updated!");
            }
            Ok(false) => self.not_found(task_id),
            Err(e) => self.absorb(e)?,
        }
        self.list()
    }

    pub fn delete(&mut self, task_id: i64) -> Result<TaskBoard> {
        if self.db.delete_task(task_id)? {
            info!(task_id, "Task deleted");
            self.success("Task deleted!");
        } else {
            self.not_found(task_id);
        }
        self.list()
    }

    /// Rewrite the order of one column from the full id list for that column.
    pub fn reorder(&mut self, task_ids: &[i64], status: TaskStatus) -> Result<TaskBoard> {
        self.db.reorder_tasks(task_ids, status)?;
        info!(status = %status, count = task_ids.len(), "Column reordered");
        self.success("Order saved!");
        self.list()
    }

    pub fn move_task(
        &mut self,
        task_id: i64,
        new_order: i64,
        new_status: Option<TaskStatus>,
    ) -> Result<TaskBoard> {
        if self.db.move_task(task_id, new_order, new_status)? {
            info!(task_id, order = new_order, "Task moved");
            self.success("Task moved!");
        } else {
            self.not_found(task_id);
        }
        self.list()
    }

    fn success(&mut self, text: &str) {
        self.messages.push(Message::success(text));
    }

    fn not_found(&mut self, task_id: i64) {
        debug!(task_id, "Task not found");
        self.messages.push(Message::error(TaskError::task_not_found().message));
    }

    /// Turn expected validation failures into messages; pass anything else up.
    fn absorb(&mut self, err: anyhow::Error) -> Result<()> {
        match err.downcast::<TaskError>() {
            Ok(task_err) if task_err.is_user_facing() => {
                debug!(code = ?task_err.code, "Rejected: {}", task_err.message);
                self.messages.push(Message::error(task_err.message));
                Ok(())
            }
            Ok(task_err) => Err(task_err.into()),
            Err(err) => Err(err),
        }
    }
}
