//! Per-chat rate limiter for outgoing messages.
//!
//! Telegram rejects bots that send more than about one message per second
//! to the same chat with a flood wait; this spaces sends out per chat.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Chat identifier the limiter is keyed by.
pub type ChatId = i64;

/// Rate limiter that enforces a minimum interval between sends to one chat.
#[derive(Debug)]
pub struct RateLimiter {
    /// Minimum duration between sends to the same chat.
    min_interval: Duration,

    /// Earliest instant the next send to each chat may happen.
    next_allowed: Mutex<HashMap<ChatId, Instant>>,
}

impl RateLimiter {
    /// Creates a new rate limiter with the specified minimum interval.
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_allowed: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a rate limiter from milliseconds.
    #[must_use]
    pub fn from_millis(millis: u64) -> Self {
        Self::new(Duration::from_millis(millis))
    }

    /// Reserves the next send slot for `chat_id` and waits for it.
    ///
    /// Concurrent callers for the same chat are queued one interval apart.
    /// Returns the duration waited (0 if no wait was needed).
    pub async fn wait_and_acquire(&self, chat_id: ChatId) -> Duration {
        let wait = {
            let mut next_allowed = self.next_allowed.lock().await;
            let now = Instant::now();
            let slot = next_allowed
                .get(&chat_id)
                .copied()
                .filter(|at| *at > now)
                .unwrap_or(now);
            next_allowed.insert(chat_id, slot + self.min_interval);
            slot - now
        };

        if !wait.is_zero() {
            debug!("Rate limiter: waiting {:?} before sending to {}", wait, chat_id);
            tokio::time::sleep(wait).await;
        }
        wait
    }

    /// Checks if a send to `chat_id` is currently allowed without blocking.
    pub async fn is_allowed(&self, chat_id: ChatId) -> bool {
        self.time_until_allowed(chat_id).await.is_zero()
    }

    /// Returns the time remaining until the next send to `chat_id` is allowed.
    pub async fn time_until_allowed(&self, chat_id: ChatId) -> Duration {
        let next_allowed = self.next_allowed.lock().await;
        next_allowed
            .get(&chat_id)
            .map_or(Duration::ZERO, |at| at.saturating_duration_since(Instant::now()))
    }

    /// Records a flood wait reported by Telegram for `chat_id`.
    pub async fn handle_flood_wait(&self, chat_id: ChatId, wait_seconds: u32) {
        warn!(
            "Received flood wait from Telegram for chat {}: {} seconds",
            chat_id, wait_seconds
        );
        let until = Instant::now() + Duration::from_secs(u64::from(wait_seconds));
        self.next_allowed.lock().await.insert(chat_id, until);
    }

    /// Forgets chats whose slots have passed.
    pub async fn prune(&self) {
        let now = Instant::now();
        self.next_allowed.lock().await.retain(|_, at| *at > now);
    }

    /// Number of chats currently tracked.
    pub async fn tracked_chats(&self) -> usize {
        self.next_allowed.lock().await.len()
    }
}
