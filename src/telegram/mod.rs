//! Telegram transport.
//!
//! Connects as a bot over `MTProto`, forwards updates to the
//! [`Router`](crate::commands::Router) and delivers its replies through
//! per-chat queues with per-chat rate limiting.

mod client;
mod delivery;
mod rate_limiter;
mod runner;

pub use client::{CatalogueBot, TelegramError};
pub use delivery::DeliveryQueues;
pub use grammers_client::update::Update;
pub use rate_limiter::{ChatId, RateLimiter};
pub use runner::{RunnerMessage, UpdateRunner};
