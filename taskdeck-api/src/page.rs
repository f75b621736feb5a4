//! Task list queries and paginated responses.

use serde::{Deserialize, Serialize};

use crate::task::{Task, TaskPriority, TaskStatus, ValidationError};

/// Filter and pagination parameters for listing tasks.
///
/// Every field is optional; unset fields must not appear as query
/// parameters at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskQuery {
    /// Restrict to tasks with this status.
    pub status: Option<TaskStatus>,
    /// Restrict to tasks with this priority.
    pub priority: Option<TaskPriority>,
    /// Maximum number of tasks to return.
    pub limit: Option<u32>,
    /// Number of tasks to skip.
    pub offset: Option<u32>,
}

impl TaskQuery {
    /// Renders the set fields as query parameter pairs, omitting unset
    /// ones.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(status) = self.status {
            pairs.push(("status", status.to_string()));
        }
        if let Some(priority) = self.priority {
            pairs.push(("priority", priority.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        if let Some(offset) = self.offset {
            pairs.push(("offset", offset.to_string()));
        }
        pairs
    }
}

/// Pagination block attached to a task page, when the server sends one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// Total number of tasks matching the query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    /// Page size used by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    /// Offset of this page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

/// A single page of tasks as returned by `GET /tasks`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPage {
    /// The tasks on this page.
    pub tasks: Vec<Task>,
    /// Optional pagination metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PageInfo>,
}

impl TaskPage {
    /// Structurally validates every task on the page.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] encountered.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for task in &self.tasks {
            task.validate()?;
        }
        Ok(())
    }
}
