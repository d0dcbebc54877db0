//! Per-user pending conversation flows.

use std::collections::HashMap;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

/// Identifier of the user (chat) a flow belongs to.
pub type UserId = i64;

/// A multi-step interaction waiting for the user's next free-text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingFlow {
    /// A program was picked for recommendations; waiting for a self-description.
    AwaitingBackground { program: String },

    /// The user asked to search; waiting for the query.
    AwaitingSearchQuery,
}

/// Conversation state errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("No pending recommendation flow for user {user_id}")]
    NoPendingFlow { user_id: UserId },
}

/// Single-flow-per-user store of pending interactions.
///
/// A second `begin` for the same user overwrites the first.
#[derive(Debug, Default)]
pub struct ConversationState {
    pending: Mutex<HashMap<UserId, PendingFlow>>,
}

impl ConversationState {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a recommendation flow for `program`.
    pub async fn begin(&self, user_id: UserId, program: impl Into<String>) {
        let program = program.into();
        debug!("User {} awaiting background for '{}'", user_id, program);
        self.pending
            .lock()
            .await
            .insert(user_id, PendingFlow::AwaitingBackground { program });
    }

    /// Starts a course-search flow.
    pub async fn begin_search(&self, user_id: UserId) {
        debug!("User {} awaiting search query", user_id);
        self.pending
            .lock()
            .await
            .insert(user_id, PendingFlow::AwaitingSearchQuery);
    }

    /// Removes the user's entry and returns the program of a recommendation flow.
    ///
    /// The entry is removed even when it is not a recommendation flow, so a
    /// stale flow can never be replayed.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoPendingFlow`] if no recommendation flow was pending.
    pub async fn consume(&self, user_id: UserId) -> Result<String, SessionError> {
        match self.take(user_id).await {
            Some(PendingFlow::AwaitingBackground { program }) => Ok(program),
            _ => Err(SessionError::NoPendingFlow { user_id }),
        }
    }

    /// Removes and returns whatever flow is pending for the user.
    pub async fn take(&self, user_id: UserId) -> Option<PendingFlow> {
        self.pending.lock().await.remove(&user_id)
    }

    /// Returns the pending flow without removing it.
    pub async fn peek(&self, user_id: UserId) -> Option<PendingFlow> {
        self.pending.lock().await.get(&user_id).cloned()
    }

    /// Drops any pending flow for the user.
    pub async fn cancel(&self, user_id: UserId) {
        if self.pending.lock().await.remove(&user_id).is_some() {
            debug!("Cancelled pending flow for user {}", user_id);
        }
    }

    /// Number of users with a pending flow.
    pub async fn len(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// Checks if no flow is pending.
    pub async fn is_empty(&self) -> bool {
        self.pending.lock().await.is_empty()
    }
}
