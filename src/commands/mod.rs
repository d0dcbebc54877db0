//! Command handling module.
//!
//! Parses menu commands and inline-button payloads, runs them against the
//! catalogue engines and renders the replies. Transport independent: the
//! Telegram layer only converts updates into [`Event`]s and delivers
//! [`Reply`]s.

pub mod format;
mod handler;
mod types;

pub use handler::Router;
pub use types::{
    CallbackData, CallbackError, Event, InlineButton, Keyboard, MenuCommand, Reply, ReplyMode,
    MAX_CALLBACK_DATA_LEN,
};
