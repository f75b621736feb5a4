//! Process-wide reactive store: the single source of truth for
//! application state.
//!
//! The store holds one immutable snapshot behind an `Arc`; every
//! mutation builds a new snapshot, swaps the reference, then notifies
//! all subscribers synchronously in subscription order. Subscribers
//! therefore observe every intermediate state (optimistic, then final),
//! never a half-written one. Mutations racing on different threads are
//! delivered in the order their swaps happened. Mutations go through [`StatePatch`]; the
//! task operations are expressed purely as patches over the task
//! sequence, so no other component ever constructs the task list.
//!
//! Side effect: a patch that changes `auth.token` synchronizes the
//! on-disk copy before notifying. Persistence failures are swallowed;
//! the in-memory state stays authoritative.

pub mod token;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use taskdeck_api::{Task, TaskId};

pub use token::TokenFile;

/// Which slice of the task list the presentation shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Filter {
    /// All tasks.
    #[default]
    All,
    /// Only tasks that are not completed.
    Active,
    /// Only completed tasks.
    Completed,
}

impl Filter {
    /// Returns `true` if the task passes this filter.
    #[must_use]
    pub fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Active => task.status != taskdeck_api::TaskStatus::Completed,
            Self::Completed => task.status == taskdeck_api::TaskStatus::Completed,
        }
    }
}

impl std::str::FromStr for Filter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            other => Err(format!("unknown filter: {other} (expected all|active|completed)")),
        }
    }
}

/// Client-side summary of the logged-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    /// Account email address.
    pub email: String,
    /// Optional display username.
    pub username: Option<String>,
}

/// Authentication sub-state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    /// Bearer token; `None` means logged-out.
    pub token: Option<String>,
    /// Summary of the logged-in user.
    pub user: Option<UserProfile>,
}

/// One immutable snapshot of application state.
///
/// Task order is meaningful: additions go to the front (newest-first).
#[derive(Debug, Clone, Default)]
pub struct AppState {
    /// Ordered task sequence, newest first.
    pub tasks: Vec<Task>,
    /// Current presentation filter.
    pub filter: Filter,
    /// Current title search text.
    pub search: String,
    /// Whether an initial load is in flight.
    pub loading: bool,
    /// Persistent load error, cleared by the next successful load.
    pub error: Option<String>,
    /// Authentication sub-state.
    pub auth: AuthState,
}

impl AppState {
    /// Finds a task by id.
    #[must_use]
    pub fn find_task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    /// Tasks visible under the current filter and search text.
    ///
    /// Search is a case-insensitive title substring match. This is the
    /// derived view the presentation renders; it never feeds back into
    /// the stored sequence.
    #[must_use]
    pub fn visible_tasks(&self) -> Vec<&Task> {
        let needle = self.search.to_lowercase();
        self.tasks
            .iter()
            .filter(|t| self.filter.matches(t))
            .filter(|t| needle.is_empty() || t.title.to_lowercase().contains(&needle))
            .collect()
    }
}

/// A partial state update. Unset fields leave the snapshot untouched.
///
/// `error`, `token`, and `user` are nullable fields, so setting them
/// takes an `Option`: `error(None)` clears the error, while an unset
/// patch field leaves it alone.
#[derive(Debug, Default)]
pub struct StatePatch {
    tasks: Option<Vec<Task>>,
    filter: Option<Filter>,
    search: Option<String>,
    loading: Option<bool>,
    error: Option<Option<String>>,
    token: Option<Option<String>>,
    user: Option<Option<UserProfile>>,
}

impl StatePatch {
    /// Creates an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the task sequence. Not public: external code goes
    /// through the [`Store`] task operations, which keep ids unique.
    #[must_use]
    fn tasks(mut self, tasks: Vec<Task>) -> Self {
        self.tasks = Some(tasks);
        self
    }

    /// Sets the presentation filter.
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Sets the search text.
    #[must_use]
    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    /// Sets the loading flag.
    #[must_use]
    pub fn loading(mut self, loading: bool) -> Self {
        self.loading = Some(loading);
        self
    }

    /// Sets or clears the persistent error message.
    #[must_use]
    pub fn error(mut self, error: Option<String>) -> Self {
        self.error = Some(error);
        self
    }

    /// Sets or clears the bearer token.
    #[must_use]
    pub fn token(mut self, token: Option<String>) -> Self {
        self.token = Some(token);
        self
    }

    /// Sets or clears the user summary.
    #[must_use]
    pub fn user(mut self, user: Option<UserProfile>) -> Self {
        self.user = Some(user);
        self
    }

    /// Merges this patch into `state`, returning whether the token
    /// value changed.
    fn merge_into(self, state: &mut AppState) -> bool {
        if let Some(tasks) = self.tasks {
            state.tasks = tasks;
        }
        if let Some(filter) = self.filter {
            state.filter = filter;
        }
        if let Some(search) = self.search {
            state.search = search;
        }
        if let Some(loading) = self.loading {
            state.loading = loading;
        }
        if let Some(error) = self.error {
            state.error = error;
        }
        let mut token_changed = false;
        if let Some(token) = self.token {
            token_changed = state.auth.token != token;
            state.auth.token = token;
        }
        if let Some(user) = self.user {
            state.auth.user = user;
        }
        token_changed
    }
}

type ListenerFn = Arc<dyn Fn(&AppState) + Send + Sync>;

struct ListenerEntry {
    id: u64,
    callback: ListenerFn,
}

/// Handle returned by [`Store::subscribe`]. Invoking
/// [`unsubscribe`](Subscription::unsubscribe) removes the listener;
/// further invocations are no-ops. Dropping the handle does NOT
/// unsubscribe; listeners outlive handles that were only kept to
/// unsubscribe later.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    listeners: Weak<Mutex<Vec<ListenerEntry>>>,
}

impl Subscription {
    /// Removes the listener this handle was created for.
    ///
    /// Removal is keyed by a unique listener id, so calling this twice,
    /// or interleaved with other unsubscriptions, never removes a
    /// different listener.
    pub fn unsubscribe(&self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.lock().retain(|entry| entry.id != self.id);
        }
    }
}

impl std::fmt::Debug for ListenerEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerEntry").field("id", &self.id).finish()
    }
}

/// Process-wide reactive store.
///
/// Constructed once at process start and injected into the sync
/// controller and the presentation layer; never ambient module state.
pub struct Store {
    state: Mutex<Arc<AppState>>,
    listeners: Arc<Mutex<Vec<ListenerEntry>>>,
    next_listener_id: AtomicU64,
    /// Snapshots awaiting delivery, enqueued in swap order.
    pending: Mutex<VecDeque<Arc<AppState>>>,
    /// Set while one thread is delivering from `pending`.
    draining: AtomicBool,
    token_file: Option<TokenFile>,
}

impl Store {
    /// Creates a store with an empty snapshot, restoring a persisted
    /// token if one exists.
    #[must_use]
    pub fn new(token_file: Option<TokenFile>) -> Self {
        let token = token_file.as_ref().and_then(TokenFile::load);
        let state = AppState {
            auth: AuthState {
                token,
                user: None,
            },
            ..AppState::default()
        };
        Self {
            state: Mutex::new(Arc::new(state)),
            listeners: Arc::new(Mutex::new(Vec::new())),
            next_listener_id: AtomicU64::new(0),
            pending: Mutex::new(VecDeque::new()),
            draining: AtomicBool::new(false),
            token_file,
        }
    }

    /// Returns the current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<AppState> {
        Arc::clone(&self.state.lock())
    }

    /// Registers a listener, immediately replays the current snapshot
    /// to it once, and returns an unsubscribe handle.
    pub fn subscribe(&self, listener: impl Fn(&AppState) + Send + Sync + 'static) -> Subscription {
        let id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
        let callback: ListenerFn = Arc::new(listener);
        self.listeners.lock().push(ListenerEntry {
            id,
            callback: Arc::clone(&callback),
        });
        // Replay so new subscribers render without waiting for the
        // next mutation.
        callback(&self.snapshot());
        Subscription {
            id,
            listeners: Arc::downgrade(&self.listeners),
        }
    }

    /// Merges the patch into a new snapshot, swaps the reference, and
    /// notifies all current subscribers synchronously in subscription
    /// order.
    pub fn apply(&self, patch: StatePatch) {
        self.apply_with(|_| Some(patch));
    }

    /// Replaces the task sequence wholesale (e.g. after a load).
    ///
    /// Duplicate ids are dropped defensively, keeping the first
    /// occurrence.
    pub fn set_tasks(&self, tasks: Vec<Task>) {
        self.apply_with(|_| {
            let mut seen = Vec::with_capacity(tasks.len());
            let mut unique = Vec::with_capacity(tasks.len());
            for task in tasks {
                if seen.contains(&task.id) {
                    tracing::warn!(id = %task.id, "dropping task with duplicate id");
                } else {
                    seen.push(task.id.clone());
                    unique.push(task);
                }
            }
            Some(StatePatch::new().tasks(unique))
        });
    }

    /// Inserts a task at the front of the sequence (newest-first).
    ///
    /// If a task with the same id already exists the insert is skipped:
    /// id uniqueness is an invariant of the snapshot, not a trust in
    /// random placeholder ids.
    pub fn insert_front(&self, task: Task) {
        self.apply_with(|state| {
            if state.find_task(&task.id).is_some() {
                tracing::warn!(id = %task.id, "refusing to insert duplicate task id");
                return None;
            }
            let mut tasks = Vec::with_capacity(state.tasks.len() + 1);
            tasks.push(task);
            tasks.extend(state.tasks.iter().cloned());
            Some(StatePatch::new().tasks(tasks))
        });
    }

    /// Replaces the task with the given id in place, preserving its
    /// position. No-op (no notification) when the id is absent.
    pub fn replace_by_id(&self, id: &TaskId, replacement: Task) {
        self.apply_with(|state| {
            if state.find_task(id).is_none() {
                return None;
            }
            let tasks = state
                .tasks
                .iter()
                .map(|t| {
                    if &t.id == id {
                        replacement.clone()
                    } else {
                        t.clone()
                    }
                })
                .collect();
            Some(StatePatch::new().tasks(tasks))
        });
    }

    /// Removes the task with the given id. No-op (no notification)
    /// when the id is absent.
    pub fn remove_by_id(&self, id: &TaskId) {
        self.apply_with(|state| {
            if state.find_task(id).is_none() {
                return None;
            }
            let tasks = state.tasks.iter().filter(|t| &t.id != id).cloned().collect();
            Some(StatePatch::new().tasks(tasks))
        });
    }

    /// Computes a patch against the locked snapshot and applies it
    /// atomically. `None` means no change: no swap, no notification.
    fn apply_with<F>(&self, build: F)
    where
        F: FnOnce(&AppState) -> Option<StatePatch>,
    {
        {
            let mut state = self.state.lock();
            let Some(patch) = build(state.as_ref()) else {
                return;
            };
            let mut next = AppState::clone(state.as_ref());
            let token_changed = patch.merge_into(&mut next);
            let next = Arc::new(next);
            if token_changed {
                self.persist_token(next.auth.token.as_deref());
            }
            *state = Arc::clone(&next);
            // Enqueued while the state lock is held, so queue order is
            // swap order even when applies race across threads.
            self.pending.lock().push_back(next);
        }
        self.drain_pending();
    }

    /// Delivers queued snapshots, one drainer at a time, so listeners
    /// see snapshots in the order the swaps happened. An apply that
    /// finds an active drainer returns immediately; that drainer
    /// delivers its snapshot. Locks are never held across listener
    /// callbacks, so listeners may mutate the store.
    fn drain_pending(&self) {
        if self.draining.swap(true, Ordering::Acquire) {
            return;
        }
        loop {
            let snapshot = self.pending.lock().pop_front();
            match snapshot {
                Some(snapshot) => self.notify(&snapshot),
                None => {
                    self.draining.store(false, Ordering::Release);
                    // A racing apply may have enqueued after the last
                    // pop; resume draining unless another thread has.
                    if self.pending.lock().is_empty()
                        || self.draining.swap(true, Ordering::Acquire)
                    {
                        return;
                    }
                }
            }
        }
    }

    /// Synchronizes the on-disk token with the in-memory value.
    /// Failures are swallowed; in-memory state stays authoritative.
    fn persist_token(&self, token: Option<&str>) {
        let Some(file) = &self.token_file else {
            return;
        };
        let result = match token {
            Some(token) => file.save(token),
            None => file.clear(),
        };
        if let Err(e) = result {
            tracing::warn!(path = %file.path().display(), error = %e, "failed to persist token");
        }
    }

    /// Fans the snapshot out to every listener registered at this
    /// moment, in subscription order. The listener list is cloned
    /// first, so listeners may subscribe or unsubscribe freely during
    /// notification.
    fn notify(&self, snapshot: &AppState) {
        let callbacks: Vec<ListenerFn> = self
            .listeners
            .lock()
            .iter()
            .map(|entry| Arc::clone(&entry.callback))
            .collect();
        for callback in callbacks {
            callback(snapshot);
        }
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("state", &self.state.lock())
            .field("listeners", &self.listeners.lock().len())
            .finish()
    }
}
