//! Per-browser session state.
//!
//! A [`SessionStore`] is the single owner of "who is signed in" for one
//! browser session. Mutations go through a `watch` channel so that any number
//! of readers can observe them, including requests waiting for an in-flight
//! sign-in to finish.

pub mod registry;

pub use registry::SessionRegistry;

use crate::models::SessionUser;
use serde::Serialize;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub user: Option<SessionUser>,
    pub loading: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            user: None,
            loading: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// User-visible notification, rendered once on the next page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self.level {
            NoticeLevel::Success => "notice notice-success",
            NoticeLevel::Error => "notice notice-error",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Session did not finish loading within {0:?}")]
pub struct LoadTimeout(pub Duration);

#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    state: watch::Sender<SessionState>,
    notices: Mutex<Vec<Notice>>,
    last_seen: AtomicI64,
    /// Auth operations take turns on this lock.
    operations: tokio::sync::Mutex<()>,
    /// Operations running or queued for a turn.
    in_flight: Mutex<usize>,
}

/// Held for the whole of one auth operation.
///
/// Operations on a store run one at a time, in arrival order. The store
/// reports `loading` while any operation is running or waiting for its turn.
pub struct OperationGuard<'a> {
    _turn: tokio::sync::MutexGuard<'a, ()>,
    _pending: PendingOperation<'a>,
}

struct PendingOperation<'a>(&'a SessionStore);

impl Drop for PendingOperation<'_> {
    fn drop(&mut self) {
        self.0.adjust_in_flight(false);
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// New stores start in the loading state until the initial load finishes.
    pub fn new() -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            inner: Arc::new(StoreInner {
                state,
                notices: Mutex::new(Vec::new()),
                last_seen: AtomicI64::new(chrono::Utc::now().timestamp()),
                operations: tokio::sync::Mutex::new(()),
                in_flight: Mutex::new(0),
            }),
        }
    }

    pub fn snapshot(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    pub fn user(&self) -> Option<SessionUser> {
        self.inner.state.borrow().user.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().loading
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    fn set_loading(&self, loading: bool) {
        self.inner.state.send_if_modified(|state| {
            let changed = state.loading != loading;
            state.loading = loading;
            changed
        });
    }

    pub fn set_user(&self, user: Option<SessionUser>) {
        self.inner.state.send_modify(|state| state.user = user);
    }

    /// Modify the signed-in user in place. Returns false when nobody is signed in.
    pub fn update_user(&self, f: impl FnOnce(&mut SessionUser)) -> bool {
        self.inner.state.send_if_modified(|state| match state.user.as_mut() {
            Some(user) => {
                f(user);
                true
            }
            None => false,
        })
    }

    /// Record the result of the initial load. An operation that started in
    /// the meantime keeps the store loading.
    pub fn finish_initial_load(&self, user: Option<SessionUser>) {
        let in_flight = self.in_flight();
        self.inner.state.send_modify(|state| {
            state.user = user;
            state.loading = *in_flight > 0;
        });
    }

    /// Wait for this store's turn to run an auth operation.
    pub async fn begin_operation(&self) -> OperationGuard<'_> {
        self.adjust_in_flight(true);
        let pending = PendingOperation(self);
        let turn = self.inner.operations.lock().await;
        OperationGuard {
            _turn: turn,
            _pending: pending,
        }
    }

    fn adjust_in_flight(&self, starting: bool) {
        let mut in_flight = self.in_flight();
        if starting {
            *in_flight += 1;
        } else {
            *in_flight = in_flight.saturating_sub(1);
        }
        self.set_loading(*in_flight > 0);
    }

    fn in_flight(&self) -> std::sync::MutexGuard<'_, usize> {
        self.inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Wait until the store is no longer loading, or give up after `timeout`.
    pub async fn wait_until_loaded(&self, timeout: Duration) -> Result<SessionState, LoadTimeout> {
        let mut receiver = self.subscribe();
        let waited = tokio::time::timeout(timeout, async {
            receiver
                .wait_for(|state| !state.loading)
                .await
                .map(|state| state.clone())
        })
        .await;

        match waited {
            Ok(Ok(state)) => Ok(state),
            // The sender lives as long as this store, so the channel cannot close here.
            Ok(Err(_)) => Ok(self.snapshot()),
            Err(_) => Err(LoadTimeout(timeout)),
        }
    }

    pub fn push_notice(&self, notice: Notice) {
        self.notices().push(notice);
    }

    /// Drain pending notices.
    pub fn take_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices())
    }

    pub fn touch(&self) {
        self.inner
            .last_seen
            .store(chrono::Utc::now().timestamp(), Ordering::Relaxed);
    }

    pub fn idle_for(&self) -> Duration {
        let idle = chrono::Utc::now().timestamp() - self.inner.last_seen.load(Ordering::Relaxed);
        Duration::from_secs(idle.max(0) as u64)
    }

    fn notices(&self) -> std::sync::MutexGuard<'_, Vec<Notice>> {
        self.inner
            .notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
