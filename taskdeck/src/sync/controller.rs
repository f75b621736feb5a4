//! The sync controller: turns user intents into optimistic flows.

use std::sync::Arc;

use tokio::sync::mpsc;

use taskdeck_api::{
    CreateTaskRequest, Credentials, Registration, Task, TaskId, TaskQuery, UserSummary,
    validate_title,
};

use crate::gateway::{GatewayError, TaskGateway};
use crate::store::{StatePatch, Store, UserProfile};

use super::{FlowOutcome, Notice};

/// Default capacity for the notice channel.
pub const DEFAULT_NOTICE_BUFFER: usize = 64;

/// Orchestrates the optimistic add/toggle/delete flows plus load and
/// auth against a [`TaskGateway`], mutating the shared [`Store`].
///
/// Flows are independent: concurrent flows on different task ids may
/// interleave arbitrarily; flows racing on the same id resolve by
/// last-mutation-wins, and every rollback re-checks the presence of
/// its target instead of blindly overwriting.
pub struct SyncController<G> {
    store: Arc<Store>,
    gateway: G,
    notices: mpsc::Sender<Notice>,
}

impl<G: TaskGateway> SyncController<G> {
    /// Creates a controller over the given store and gateway. Notices
    /// are emitted on `notices`; an undrained channel drops them.
    pub const fn new(store: Arc<Store>, gateway: G, notices: mpsc::Sender<Notice>) -> Self {
        Self {
            store,
            gateway,
            notices,
        }
    }

    /// Returns the store this controller mutates.
    #[must_use]
    pub const fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Loads the task list from the server.
    ///
    /// Sets the loading flag for the duration. On failure the error
    /// message is persistent, staying in the snapshot until the next
    /// successful load, in addition to the transient notice.
    pub async fn load_tasks(&self) {
        self.store.apply(StatePatch::new().loading(true).error(None));
        match self.gateway.list_tasks(&TaskQuery::default()).await {
            Ok(page) => {
                self.store.set_tasks(page.tasks);
                self.store.apply(StatePatch::new().loading(false));
            }
            Err(e) => {
                let text = failure_text(&e, "Failed to load tasks");
                self.store
                    .apply(StatePatch::new().loading(false).error(Some(text)));
                self.notice(Notice::error("Failed to load tasks"));
            }
        }
    }

    /// Create flow: speculative placeholder at the front of the list,
    /// replaced in place by the server-confirmed task, or removed on
    /// failure.
    pub async fn add_task(&self, title: &str) -> FlowOutcome {
        if let Err(e) = validate_title(title) {
            self.notice(Notice::error(e.to_string()));
            return FlowOutcome::Skipped;
        }

        let placeholder = placeholder_task(title);
        let placeholder_id = placeholder.id.clone();
        self.store.insert_front(placeholder);

        match self.gateway.create_task(&CreateTaskRequest::new(title)).await {
            Ok(confirmed) => {
                // No-op if the placeholder was removed meanwhile; the
                // confirmed task must not be resurrected.
                self.store.replace_by_id(&placeholder_id, confirmed);
                self.notice(Notice::success("Task added"));
                FlowOutcome::Committed
            }
            Err(e) => {
                self.store.remove_by_id(&placeholder_id);
                self.notice(Notice::error(failure_text(&e, "Failed to add task")));
                FlowOutcome::RolledBack
            }
        }
    }

    /// Toggle flow: flips the status optimistically, then adopts the
    /// server's authoritative representation, or restores the exact
    /// pre-toggle task on failure.
    pub async fn toggle_task(&self, id: &TaskId) -> FlowOutcome {
        let Some(before) = self.store.snapshot().find_task(id).cloned() else {
            // Already removed, e.g. by a concurrent delete.
            return FlowOutcome::Skipped;
        };
        if before.id.is_placeholder() {
            // Not yet a durable entity; its affordances are disabled.
            return FlowOutcome::Skipped;
        }

        let mut optimistic = before.clone();
        optimistic.status = before.status.flipped();
        self.store.replace_by_id(id, optimistic);

        match self.gateway.complete_task(id).await {
            Ok(server_task) => {
                self.store.replace_by_id(id, server_task);
                FlowOutcome::Committed
            }
            Err(e) => {
                // Full object restore, not a status flip, so no field
                // drift is lost. replace_by_id re-checks presence.
                self.store.replace_by_id(id, before);
                self.notice(Notice::error(failure_text(&e, "Failed to update task")));
                FlowOutcome::RolledBack
            }
        }
    }

    /// Delete flow: removes immediately, reinserts the captured task
    /// on failure. A remote "not found" is success: the task is gone
    /// either way.
    pub async fn delete_task(&self, id: &TaskId) -> FlowOutcome {
        let Some(captured) = self.store.snapshot().find_task(id).cloned() else {
            return FlowOutcome::Skipped;
        };
        if captured.id.is_placeholder() {
            return FlowOutcome::Skipped;
        }

        self.store.remove_by_id(id);
        self.notice(Notice::info("Removing task…"));

        match self.gateway.delete_task(id).await {
            Ok(()) => {
                self.notice(Notice::success("Task deleted"));
                FlowOutcome::Committed
            }
            Err(e) => {
                // Best-effort position; the original slot need not be
                // preserved.
                self.store.insert_front(captured);
                self.notice(Notice::error(failure_text(&e, "Failed to delete task")));
                FlowOutcome::RolledBack
            }
        }
    }

    /// Logs in and stores the bearer token (persisted by the store)
    /// plus a user summary for the email.
    ///
    /// # Errors
    ///
    /// Returns the gateway failure; no state is touched on error.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), GatewayError> {
        let credentials = Credentials::new(email, password);
        let tokens = self.gateway.login(&credentials).await?;
        self.store.apply(
            StatePatch::new()
                .token(Some(tokens.access_token))
                .user(Some(UserProfile {
                    email: email.to_string(),
                    username: None,
                })),
        );
        Ok(())
    }

    /// Registers a new account.
    ///
    /// # Errors
    ///
    /// Returns the gateway failure.
    pub async fn register(&self, registration: &Registration) -> Result<UserSummary, GatewayError> {
        self.gateway.register(registration).await
    }

    /// Clears the token (erasing the persisted copy) and the user.
    pub fn logout(&self) {
        self.store.apply(StatePatch::new().token(None).user(None));
    }

    /// Emits a transient notice. A full or closed channel drops it;
    /// notices are best-effort by contract.
    fn notice(&self, notice: Notice) {
        if let Err(e) = self.notices.try_send(notice) {
            tracing::debug!(error = %e, "notice dropped");
        }
    }
}

/// Builds the speculative placeholder task for the create flow.
fn placeholder_task(title: &str) -> Task {
    Task {
        id: TaskId::placeholder(),
        title: title.to_string(),
        description: None,
        status: taskdeck_api::TaskStatus::Pending,
        priority: None,
        due_date: None,
        created_at: chrono::Utc::now().to_rfc3339(),
        updated_at: None,
        category_id: None,
    }
}

/// Failure message preference: server-supplied human message, then the
/// gateway's transport-level message, then the flow-specific default.
fn failure_text(err: &GatewayError, fallback: &str) -> String {
    err.server_message()
        .map(str::to_string)
        .or_else(|| err.transport_message())
        .unwrap_or_else(|| fallback.to_string())
}
