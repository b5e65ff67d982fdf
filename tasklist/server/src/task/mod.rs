use sea_orm::{DbErr, FromQueryResult, QueryResult, Value};

use crate::db::{Gateway, GatewayError};

pub mod web;

const INSERT_TASK: &str = "INSERT INTO task (name) VALUES ($1)";
const DELETE_TASK: &str = "DELETE FROM task WHERE id = $1";
const SELECT_TASKS: &str = "SELECT id, name FROM task ORDER BY id";
const SELECT_TASK: &str = "SELECT id, name FROM task WHERE id = $1";
const INSERT_TASK_ENTRY: &str = "INSERT INTO task_entry (task_id, task_details) VALUES ($1, $2)";
const SELECT_TASK_ENTRIES: &str =
    "SELECT id, task_id, task_details FROM task_entry WHERE task_id = $1 ORDER BY id";
const DELETE_TASK_ENTRY: &str = "DELETE FROM task_entry WHERE id = $1";

#[derive(Debug, PartialEq, Clone, Eq, Hash, FromQueryResult)]
pub struct Task {
    id: i32,
    name: String,
}

impl Task {
    pub fn new(id: i32, name: String) -> Self {
        Self { id, name }
    }

    /// Returns the ID of the task.
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Returns the name of the task.
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, PartialEq, Clone, Eq, Hash, FromQueryResult)]
pub struct TaskEntry {
    id: i32,
    task_id: i32,
    task_details: String,
}

impl TaskEntry {
    pub fn new(id: i32, task_id: i32, task_details: String) -> Self {
        Self {
            id,
            task_id,
            task_details,
        }
    }

    /// Returns the ID of the entry.
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Returns the ID of the task the entry belongs to.
    pub fn task_id(&self) -> i32 {
        self.task_id
    }

    pub fn details(&self) -> &str {
        &self.task_details
    }
}

/// Error type for TaskStore operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Represents a failed gateway call.
    #[error("Database error: {0}")]
    Gateway(#[from] GatewayError),
    /// Represents a row that does not have the expected columns.
    #[error("Malformed row: {0}")]
    Decode(#[from] DbErr),
}

pub struct TaskStore<'a> {
    gateway: &'a Gateway,
}

impl TaskStore<'_> {
    pub fn new(gateway: &Gateway) -> TaskStore<'_> {
        TaskStore { gateway }
    }

    /// Creates a new task.
    ///
    /// # Arguments
    ///
    /// * `name` - The name of the task. Stored as given.
    #[tracing::instrument(skip(self))]
    pub async fn create_task(&self, name: &str) -> Result<(), StoreError> {
        self.gateway
            .execute(INSERT_TASK, vec![Value::from(name)])
            .await?;
        Ok(())
    }

    /// Deletes the task with the given ID. Deleting a missing task is not an error.
    #[tracing::instrument(skip(self))]
    pub async fn delete_task_by_id(&self, id: i32) -> Result<(), StoreError> {
        self.gateway
            .execute(DELETE_TASK, vec![Value::from(id)])
            .await?;
        Ok(())
    }

    /// Retrieves all tasks, ordered by ID.
    #[tracing::instrument(skip(self))]
    pub async fn list_tasks(&self) -> Result<Vec<Task>, StoreError> {
        let rows = self.gateway.execute(SELECT_TASKS, vec![]).await?;
        decode_rows(&rows)
    }

    /// Adds an entry to a task.
    ///
    /// # Arguments
    ///
    /// * `task_id` - The ID of the task. Must reference an existing task.
    /// * `details` - The text of the entry.
    #[tracing::instrument(skip(self))]
    pub async fn create_task_entry(&self, task_id: i32, details: &str) -> Result<(), StoreError> {
        self.gateway
            .execute(
                INSERT_TASK_ENTRY,
                vec![Value::from(task_id), Value::from(details)],
            )
            .await?;
        Ok(())
    }

    /// Retrieves the task with the given ID, if there is one.
    #[tracing::instrument(skip(self))]
    pub async fn get_task_name(&self, task_id: i32) -> Result<Option<Task>, StoreError> {
        let rows = self
            .gateway
            .execute(SELECT_TASK, vec![Value::from(task_id)])
            .await?;
        let mut tasks: Vec<Task> = decode_rows(&rows)?;
        Ok(tasks.pop())
    }

    /// Retrieves the entries of a task, ordered by ID.
    ///
    /// # Returns
    ///
    /// `None` when the task has no entries, otherwise the non-empty list.
    #[tracing::instrument(skip(self))]
    pub async fn list_task_entries(
        &self,
        task_id: i32,
    ) -> Result<Option<Vec<TaskEntry>>, StoreError> {
        let rows = self
            .gateway
            .execute(SELECT_TASK_ENTRIES, vec![Value::from(task_id)])
            .await?;
        let entries: Vec<TaskEntry> = decode_rows(&rows)?;
        Ok((!entries.is_empty()).then_some(entries))
    }

    /// Deletes the entry with the given ID.
    #[tracing::instrument(skip(self))]
    pub async fn delete_task_entry(&self, entry_id: i32) -> Result<(), StoreError> {
        self.gateway
            .execute(DELETE_TASK_ENTRY, vec![Value::from(entry_id)])
            .await?;
        Ok(())
    }
}

fn decode_rows<T: FromQueryResult>(rows: &[QueryResult]) -> Result<Vec<T>, StoreError> {
    rows.iter()
        .map(|row| T::from_query_result(row, "").map_err(StoreError::from))
        .collect()
}
