//! Conversation state.
//!
//! Tracks the one in-progress multi-step interaction each user may have.
//! Access goes through a single lock; the store is injected into the router
//! rather than referenced as ambient state.

mod state;

pub use state::{ConversationState, PendingFlow, SessionError, UserId};
