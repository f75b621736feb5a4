//! Remote task gateway abstraction.
//!
//! Defines the [`TaskGateway`] trait that the sync controller talks
//! to. Concrete implementations:
//! - [`http::HttpGateway`], the reqwest-backed client for the real
//!   REST API
//! - scripted in-process gateways live in the integration tests
//!
//! The gateway normalizes heterogeneous server responses into the
//! canonical wire model and translates every failure into a
//! [`GatewayError`], so the controller never sees transport details.

pub mod http;

pub use http::HttpGateway;

use taskdeck_api::{
    ApiErrorBody, AuthTokens, CreateTaskRequest, Credentials, Registration, Task, TaskId,
    TaskPage, TaskQuery, UserSummary, ValidationError,
};

/// Uniform failure shape for all gateway operations.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The transport deadline was exceeded. Timing out is the only
    /// cancellation mechanism: the in-flight request is aborted and the
    /// flow follows its normal failure path.
    #[error("request timed out")]
    Timeout,

    /// The server answered with a non-success status.
    #[error("api error (status {status})")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Parsed error body, when the server sent a conforming one.
        body: Option<ApiErrorBody>,
    },

    /// The server answered with a success status but the body fails
    /// structural validation.
    #[error("schema violation: {0}")]
    Schema(String),

    /// Connection-level failure other than a timeout.
    #[error("network error: {0}")]
    Transport(String),
}

impl GatewayError {
    /// Returns the server-supplied human message, when present.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Api { body: Some(body), .. } => body.message(),
            _ => None,
        }
    }

    /// Returns a transport-level message for failures that have one
    /// (timeout or connection errors). Status and schema failures
    /// return `None` so callers fall back to a flow-specific default.
    #[must_use]
    pub fn transport_message(&self) -> Option<String> {
        match self {
            Self::Timeout | Self::Transport(_) => Some(self.to_string()),
            Self::Api { .. } | Self::Schema(_) => None,
        }
    }
}

impl From<ValidationError> for GatewayError {
    fn from(e: ValidationError) -> Self {
        Self::Schema(e.to_string())
    }
}

/// Async gateway trait for task CRUD and authentication.
///
/// Implementations return validated, field-normalized wire-model
/// values; schema translation (camelCase wire ↔ snake_case model)
/// happens entirely behind this seam.
pub trait TaskGateway: Send + Sync {
    /// Fetches a page of tasks. Unset query fields are omitted from
    /// the request.
    fn list_tasks(
        &self,
        query: &TaskQuery,
    ) -> impl std::future::Future<Output = Result<TaskPage, GatewayError>> + Send;

    /// Creates a task and returns the server-confirmed representation.
    fn create_task(
        &self,
        request: &CreateTaskRequest,
    ) -> impl std::future::Future<Output = Result<Task, GatewayError>> + Send;

    /// Marks a task complete on the server. The server is
    /// authoritative for what "complete" means; the returned task may
    /// differ from any local guess.
    fn complete_task(
        &self,
        id: &TaskId,
    ) -> impl std::future::Future<Output = Result<Task, GatewayError>> + Send;

    /// Deletes a task. A server-side "not found" counts as success:
    /// the resource is gone either way.
    fn delete_task(
        &self,
        id: &TaskId,
    ) -> impl std::future::Future<Output = Result<(), GatewayError>> + Send;

    /// Authenticates and returns the token pair.
    fn login(
        &self,
        credentials: &Credentials,
    ) -> impl std::future::Future<Output = Result<AuthTokens, GatewayError>> + Send;

    /// Registers a new account.
    fn register(
        &self,
        registration: &Registration,
    ) -> impl std::future::Future<Output = Result<UserSummary, GatewayError>> + Send;
}
