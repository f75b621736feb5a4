//! Wire model for the `TaskDeck` remote task API.
//!
//! Defines the canonical task shape, query/page types, auth payloads,
//! and the uniform error body, together with structural validation of
//! server responses. The API speaks camelCase JSON; internal field
//! names are snake_case, and the translation is done field-by-field
//! with serde rename attributes rather than any dynamic renaming.

pub mod auth;
pub mod error;
pub mod page;
pub mod task;

pub use auth::{AuthTokens, Credentials, Registration, UserSummary};
pub use error::{ApiErrorBody, ErrorDetail};
pub use page::{PageInfo, TaskPage, TaskQuery};
pub use task::{
    CreateTaskRequest, MAX_DESCRIPTION_LENGTH, MAX_TITLE_LENGTH, Task, TaskId, TaskPriority,
    TaskStatus, ValidationError, validate_title,
};
