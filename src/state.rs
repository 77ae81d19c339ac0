//! Per-user navigation state
//!
//! Each user's state sits behind its own lock. The outer map lock is only held
//! for the lookup/insert, so users never wait on each other.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Caller-supplied user identifier (trusted, not verified)
pub type UserId = i64;

/// Free-form per-user key/value bag
pub type Context = serde_json::Map<String, Value>;

/// Maximum number of history entries kept per user
pub const MAX_HISTORY: usize = 10;

/// Where a user is and how they got there
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavigationState {
    pub current_menu: Option<String>,
    /// Oldest entry first; never longer than [`MAX_HISTORY`]
    pub history: VecDeque<String>,
    /// Persists across navigations until explicitly cleared
    pub context: Context,
}

impl NavigationState {
    /// Append to history, evicting the oldest entry on overflow
    pub fn push_history(&mut self, menu_id: impl Into<String>) {
        self.history.push_back(menu_id.into());
        while self.history.len() > MAX_HISTORY {
            self.history.pop_front();
        }
    }

    pub fn pop_history(&mut self) -> Option<String> {
        self.history.pop_back()
    }

    /// Move to `menu_id`, remembering the menu we came from
    pub fn enter(&mut self, menu_id: &str) {
        if let Some(previous) = self.current_menu.take() {
            self.push_history(previous);
        }
        self.current_menu = Some(menu_id.to_string());
    }

    /// Merge `values` into the context; new keys overwrite old ones
    pub fn merge_context(&mut self, values: Context) {
        self.context.extend(values);
    }

    pub fn history_vec(&self) -> Vec<String> {
        self.history.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.current_menu = None;
        self.history.clear();
        self.context.clear();
    }

    /// Re-apply the history bound after deserializing untrusted data
    pub(crate) fn normalize(&mut self) {
        while self.history.len() > MAX_HISTORY {
            self.history.pop_front();
        }
    }
}

type SharedState = Arc<Mutex<NavigationState>>;

/// Store of every user's [`NavigationState`], created lazily
#[derive(Default)]
pub struct NavigationStore {
    users: RwLock<HashMap<UserId, SharedState>>,
}

impl NavigationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to a user's state, creating an empty one on first use
    async fn entry(&self, user_id: UserId) -> SharedState {
        {
            let users = self.users.read().await;
            if let Some(state) = users.get(&user_id) {
                return Arc::clone(state);
            }
        }

        let mut users = self.users.write().await;
        Arc::clone(users.entry(user_id).or_default())
    }

    /// Run `f` with exclusive access to one user's state.
    ///
    /// Calls for the same user are linearized; `f` must not block.
    pub async fn update<R>(
        &self,
        user_id: UserId,
        f: impl FnOnce(&mut NavigationState) -> R,
    ) -> R {
        let state = self.entry(user_id).await;
        let mut guard = state.lock().await;
        f(&mut guard)
    }

    /// Snapshot of a user's state, creating it if needed
    pub async fn get_or_create(&self, user_id: UserId) -> NavigationState {
        self.update(user_id, |state| state.clone()).await
    }

    /// Snapshot of a user's state without creating one
    pub async fn peek(&self, user_id: UserId) -> Option<NavigationState> {
        let state = self.users.read().await.get(&user_id).cloned()?;
        let guard = state.lock().await;
        Some(guard.clone())
    }

    pub async fn set_current(&self, user_id: UserId, menu_id: &str) {
        self.update(user_id, |state| state.current_menu = Some(menu_id.to_string()))
            .await;
    }

    pub async fn push_history(&self, user_id: UserId, menu_id: &str) {
        self.update(user_id, |state| state.push_history(menu_id)).await;
    }

    pub async fn pop_history(&self, user_id: UserId) -> Option<String> {
        self.update(user_id, NavigationState::pop_history).await
    }

    pub async fn set_context(&self, user_id: UserId, key: impl Into<String>, value: Value) {
        let key = key.into();
        self.update(user_id, |state| {
            state.context.insert(key, value);
        })
        .await;
    }

    /// Context value for `key`, or `default` when absent
    pub async fn get_context(&self, user_id: UserId, key: &str, default: Value) -> Value {
        self.update(user_id, |state| {
            state.context.get(key).cloned().unwrap_or(default)
        })
        .await
    }

    /// Reset a user to an empty state (the entry itself is kept)
    pub async fn clear(&self, user_id: UserId) {
        let state = self.users.read().await.get(&user_id).cloned();
        if let Some(state) = state {
            state.lock().await.clear();
        }
    }

    /// Replace a user's state wholesale
    pub async fn replace(&self, user_id: UserId, mut new_state: NavigationState) {
        new_state.normalize();
        self.update(user_id, |state| *state = new_state).await;
    }

    /// Number of users with a state entry
    pub async fn active_users(&self) -> usize {
        self.users.read().await.len()
    }
}
