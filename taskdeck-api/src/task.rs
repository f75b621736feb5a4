//! Canonical task shape for the remote task API.
//!
//! Tasks arrive and leave as camelCase JSON; every struct here carries
//! an explicit serde mapping so the wire casing is schema-driven, not
//! inferred. Server-issued task ids are UUIDs; locally created
//! placeholder ids carry a reserved `tmp-` prefix that no server id
//! can have, so the two are always distinguishable.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum allowed task title length in characters.
pub const MAX_TITLE_LENGTH: usize = 100;

/// Maximum allowed task description length in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 500;

/// Prefix marking an id as a local, never-persisted placeholder.
const PLACEHOLDER_PREFIX: &str = "tmp-";

/// Identifier for a task: either a server-issued UUID or a local
/// placeholder awaiting server confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Creates a `TaskId` from a wire string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh placeholder id (`tmp-<uuid-v4>`), unique for
    /// the session with negligible collision probability.
    #[must_use]
    pub fn placeholder() -> Self {
        Self(format!("{PLACEHOLDER_PREFIX}{}", Uuid::new_v4()))
    }

    /// Returns `true` if this id is a local placeholder rather than a
    /// server-issued identifier.
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        self.0.starts_with(PLACEHOLDER_PREFIX)
    }

    /// Returns the string representation of this id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Completion state of a task. A task is always exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Task is open.
    Pending,
    /// Task has been completed.
    Completed,
}

impl TaskStatus {
    /// Returns the opposite status.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Pending => Self::Completed,
            Self::Completed => Self::Pending,
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// Priority of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    /// Low priority.
    Low,
    /// Medium priority.
    Medium,
    /// High priority.
    High,
}

impl std::fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// A task as returned by the remote API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Task identifier (server UUID, or local placeholder before
    /// confirmation).
    pub id: TaskId,
    /// Task title (1–100 characters).
    pub title: String,
    /// Optional longer description (up to 500 characters).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Completion state.
    pub status: TaskStatus,
    /// Optional priority.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    /// Optional due date string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    /// Creation timestamp string.
    pub created_at: String,
    /// Last-update timestamp string, if the server tracks it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    /// Optional category identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
}

impl Task {
    /// Structurally validates a server-returned task.
    ///
    /// The id must be a well-formed UUID (placeholders never come from
    /// the wire), the title must be 1–100 characters, and the
    /// description at most 500. Enum fields are already enforced by
    /// deserialization.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming the offending field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if Uuid::parse_str(self.id.as_str()).is_err() {
            return Err(ValidationError::MalformedId(self.id.to_string()));
        }
        validate_title(&self.title)?;
        if let Some(desc) = &self.description
            && desc.chars().count() > MAX_DESCRIPTION_LENGTH
        {
            return Err(ValidationError::DescriptionTooLong);
        }
        Ok(())
    }
}

/// Validates a task title: non-empty after trimming, at most 100
/// characters.
///
/// # Errors
///
/// Returns [`ValidationError::TitleEmpty`] or
/// [`ValidationError::TitleTooLong`].
pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::TitleEmpty);
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(ValidationError::TitleTooLong);
    }
    Ok(())
}

/// Payload for creating a task. Unset optional fields are omitted from
/// the request body entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    /// Title of the new task.
    pub title: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Optional due date string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    /// Optional priority.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    /// Optional category identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
}

impl CreateTaskRequest {
    /// Creates a title-only request.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Structural validation failures for wire payloads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Task id is not a well-formed server identifier.
    #[error("malformed task id: {0}")]
    MalformedId(String),
    /// Task title is empty.
    #[error("task title cannot be empty")]
    TitleEmpty,
    /// Task title exceeds the maximum length.
    #[error("task title too long (max {MAX_TITLE_LENGTH} characters)")]
    TitleTooLong,
    /// Task description exceeds the maximum length.
    #[error("task description too long (max {MAX_DESCRIPTION_LENGTH} characters)")]
    DescriptionTooLong,
}
