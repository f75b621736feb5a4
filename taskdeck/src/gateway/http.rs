//! HTTP gateway implementation backed by reqwest.
//!
//! Every request carries a fixed timeout (the only cancellation
//! mechanism). Non-success statuses are parsed into the uniform API
//! error body when possible; success bodies are deserialized and then
//! structurally validated before they reach the store.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use taskdeck_api::{
    ApiErrorBody, AuthTokens, CreateTaskRequest, Credentials, Registration, Task, TaskId,
    TaskPage, TaskQuery, UserSummary,
};

use crate::config::ClientConfig;
use crate::store::Store;

use super::{GatewayError, TaskGateway};

/// Statuses that make the login flow retry once with a form-encoded
/// body. The target server's accepted login encoding is not guaranteed,
/// so it must not be hard-coded to JSON.
const FORM_FALLBACK_STATUSES: [u16; 6] = [400, 401, 404, 405, 415, 422];

/// reqwest-backed [`TaskGateway`] for the remote REST API.
///
/// Reads the current bearer token from the store snapshot on every
/// task request, so login/logout take effect immediately.
pub struct HttpGateway {
    http: reqwest::Client,
    base_url: String,
    store: Arc<Store>,
}

impl HttpGateway {
    /// Builds a gateway from the resolved configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Transport`] if the HTTP client cannot
    /// be constructed.
    pub fn new(config: &ClientConfig, store: Arc<Store>) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            store,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Attaches `Authorization: Bearer <token>` when a token is
    /// present. Auth endpoints never go through here.
    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.store.snapshot().auth.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Sends a request and normalizes the failure cases: timeout,
    /// connection failure, or non-success status (with the error body
    /// parsed when it conforms).
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, GatewayError> {
        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let bytes = response.bytes().await.unwrap_or_default();
        let body = serde_json::from_slice::<ApiErrorBody>(&bytes).ok();
        tracing::warn!(status = status.as_u16(), "api request failed");
        Err(GatewayError::Api {
            status: status.as_u16(),
            body,
        })
    }

    /// Deserializes a success body; a malformed body is a schema
    /// violation, not a transport failure.
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, GatewayError> {
        let bytes = response.bytes().await.map_err(map_transport_error)?;
        serde_json::from_slice(&bytes).map_err(|e| GatewayError::Schema(e.to_string()))
    }
}

fn map_transport_error(e: reqwest::Error) -> GatewayError {
    if e.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::Transport(e.without_url().to_string())
    }
}

impl TaskGateway for HttpGateway {
    async fn list_tasks(&self, query: &TaskQuery) -> Result<TaskPage, GatewayError> {
        tracing::debug!(?query, "GET /tasks");
        let request = self
            .authorized(self.http.get(self.url("/tasks")))
            .query(&query.to_pairs());
        let response = self.send(request).await?;
        let page: TaskPage = Self::decode(response).await?;
        page.validate()?;
        Ok(page)
    }

    async fn create_task(&self, request: &CreateTaskRequest) -> Result<Task, GatewayError> {
        tracing::debug!(title = %request.title, "POST /tasks");
        let request = self.authorized(self.http.post(self.url("/tasks"))).json(request);
        let response = self.send(request).await?;
        let task: Task = Self::decode(response).await?;
        task.validate()?;
        Ok(task)
    }

    async fn complete_task(&self, id: &TaskId) -> Result<Task, GatewayError> {
        tracing::debug!(%id, "PATCH /tasks/{{id}}/complete");
        let url = self.url(&format!("/tasks/{id}/complete"));
        let request = self.authorized(self.http.patch(url));
        let response = self.send(request).await?;
        let task: Task = Self::decode(response).await?;
        task.validate()?;
        Ok(task)
    }

    async fn delete_task(&self, id: &TaskId) -> Result<(), GatewayError> {
        tracing::debug!(%id, "DELETE /tasks/{{id}}");
        let url = self.url(&format!("/tasks/{id}"));
        let request = self.authorized(self.http.delete(url));
        match self.send(request).await {
            Ok(_) => Ok(()),
            // Already deleted remotely: idempotent delete semantics.
            Err(GatewayError::Api { status: 404, .. }) => Ok(()),
            Err(e) => Err(e),
        }
    }

    async fn login(&self, credentials: &Credentials) -> Result<AuthTokens, GatewayError> {
        tracing::debug!(email = %credentials.email, "POST /auth/login");
        let json_attempt = self.http.post(self.url("/auth/login")).json(credentials);
        match self.send(json_attempt).await {
            Ok(response) => Self::decode(response).await,
            Err(GatewayError::Api { status, .. }) if FORM_FALLBACK_STATUSES.contains(&status) => {
                tracing::debug!(status, "login JSON rejected, retrying form-encoded");
                let form = [
                    ("username", credentials.email.as_str()),
                    ("password", credentials.password.as_str()),
                ];
                let form_attempt = self.http.post(self.url("/auth/login")).form(&form);
                let response = self.send(form_attempt).await?;
                Self::decode(response).await
            }
            Err(e) => Err(e),
        }
    }

    async fn register(&self, registration: &Registration) -> Result<UserSummary, GatewayError> {
        tracing::debug!(email = %registration.email, "POST /auth/register");
        let request = self.http.post(self.url("/auth/register")).json(registration);
        let response = self.send(request).await?;
        Self::decode(response).await
    }
}
