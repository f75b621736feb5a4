//! Optimistic synchronization between the local store and the remote
//! task API.
//!
//! Each user intent becomes a two-phase flow: an immediate speculative
//! store mutation, then a deferred gateway call that either commits the
//! server-confirmed result or rolls the speculation back. Failures are
//! absorbed at the flow boundary and surfaced as transient notices.

pub mod controller;

pub use controller::SyncController;

/// Resolved outcome of a sync flow.
///
/// A flow is *pending* while its future is in flight; awaiting it
/// yields one of these. The pre-state needed for rollback is captured
/// explicitly at flow start, never left implicit in closures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowOutcome {
    /// The speculative mutation was confirmed by the server.
    Committed,
    /// The gateway call failed and the speculation was undone.
    RolledBack,
    /// No speculative mutation was made: the target was absent, was an
    /// unconfirmed placeholder, or the input was invalid.
    Skipped,
}

/// Severity of a transient user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    /// Progress information ("Removing task…").
    Info,
    /// A flow committed.
    Success,
    /// A flow failed and was rolled back.
    Error,
}

/// A transient, auto-dismissed user-facing notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Severity.
    pub kind: NoticeKind,
    /// Display text.
    pub text: String,
}

impl Notice {
    /// Creates an informational notice.
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            text: text.into(),
        }
    }

    /// Creates a success notice.
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            text: text.into(),
        }
    }

    /// Creates an error notice.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }
}
