//! Telegram bot client wrapper.

use std::sync::Arc;

use grammers_client::update::{CallbackQuery, Message, Update};
use grammers_client::{
    button, reply_markup, sender, Client, InputMessage, InvocationError, SenderPool,
    UpdatesConfiguration,
};
use grammers_session::storages::SqliteSession;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::RateLimiter;
use crate::commands::{Keyboard, MenuCommand, Reply, ReplyMode};
use crate::config::TelegramConfig;

/// Capacity of the queue between the update stream and the runner.
const UPDATE_QUEUE_CAPACITY: usize = 64;

/// Errors that can occur during Telegram operations.
#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("Sign in failed: {0}")]
    SignInFailed(String),

    #[error("Flood wait required: {0} seconds")]
    FloodWait(u32),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Session error: {0}")]
    Session(String),

    #[error("Updates already taken by another runner")]
    UpdatesTaken,

    #[error("API invocation error: {0}")]
    Invocation(String),
}

impl From<InvocationError> for TelegramError {
    fn from(err: InvocationError) -> Self {
        let err_str = err.to_string();

        // Check for flood wait errors
        if (err_str.contains("FLOOD_WAIT") || err_str.contains("flood"))
            && let Some(seconds) = extract_flood_wait_seconds(&err_str)
        {
            return Self::FloodWait(seconds);
        }

        Self::Invocation(err_str)
    }
}

/// Extracts flood wait seconds from an error message.
fn extract_flood_wait_seconds(err_msg: &str) -> Option<u32> {
    let patterns = ["FLOOD_WAIT_", "flood wait "];
    let lower = err_msg.to_lowercase();

    for pattern in patterns {
        if let Some(idx) = lower.find(&pattern.to_lowercase()) {
            let start = idx + pattern.len();
            let num_str: String = lower[start..]
                .chars()
                .take_while(char::is_ascii_digit)
                .collect();
            if let Ok(seconds) = num_str.parse() {
                return Some(seconds);
            }
        }
    }
    None
}

/// High-level Telegram bot client.
pub struct CatalogueBot {
    /// The underlying grammers client.
    client: Client,

    /// Handle to the sender pool for disconnection.
    handle: sender::SenderPoolHandle,

    /// Per-chat rate limiter for outgoing messages.
    rate_limiter: RateLimiter,

    /// Incoming updates, taken once by the runner.
    updates: Mutex<Option<mpsc::Receiver<Update>>>,

    /// Background task running the sender pool.
    _pool_task: JoinHandle<()>,

    /// Background task forwarding the update stream.
    _updates_task: JoinHandle<()>,
}

impl CatalogueBot {
    /// Connects to Telegram and signs in as a bot if the session is new.
    ///
    /// # Errors
    ///
    /// Returns an error if connection or sign-in fails.
    pub async fn connect(
        config: &TelegramConfig,
        min_send_interval_ms: u64,
    ) -> Result<Self, TelegramError> {
        info!("Connecting to Telegram...");

        let session = Arc::new(
            SqliteSession::open(&config.session_path)
                .await
                .map_err(|e| TelegramError::Session(e.to_string()))?,
        );

        let SenderPool {
            runner,
            updates,
            handle,
        } = SenderPool::new(Arc::clone(&session), config.api_id);

        let client = Client::new(handle.clone());

        // Spawn the sender pool runner
        let pool_task = tokio::spawn(async move {
            runner.run().await;
        });

        let is_authorized = client
            .is_authorized()
            .await
            .map_err(|e| TelegramError::Connection(e.to_string()))?;

        if is_authorized {
            info!("Connected to Telegram with existing bot session");
        } else {
            info!("Signing in with bot token...");
            let user = client
                .bot_sign_in(&config.bot_token, &config.api_hash)
                .await
                .map_err(|e| TelegramError::SignInFailed(e.to_string()))?;
            info!("Signed in as bot (id: {})", user.id());
        }

        let (update_tx, update_rx) = mpsc::channel(UPDATE_QUEUE_CAPACITY);
        let mut stream = client.stream_updates(
            updates,
            UpdatesConfiguration {
                catch_up: false,
                ..Default::default()
            },
        );
        let updates_task = tokio::spawn(async move {
            loop {
                match stream.next().await {
                    Ok(update) => {
                        if update_tx.send(update).await.is_err() {
                            debug!("Update receiver dropped, stopping stream");
                            break;
                        }
                    }
                    Err(e) => {
                        error!("Update stream failed: {}", e);
                        break;
                    }
                }
            }
        });

        Ok(Self {
            client,
            handle: handle.thin,
            rate_limiter: RateLimiter::from_millis(min_send_interval_ms),
            updates: Mutex::new(Some(update_rx)),
            _pool_task: pool_task,
            _updates_task: updates_task,
        })
    }

    /// Takes the incoming update queue. Only one runner may own it.
    ///
    /// # Errors
    ///
    /// Returns [`TelegramError::UpdatesTaken`] on the second call.
    pub async fn take_updates(&self) -> Result<mpsc::Receiver<Update>, TelegramError> {
        self.updates
            .lock()
            .await
            .take()
            .ok_or(TelegramError::UpdatesTaken)
    }

    /// Delivers a reply to a text message.
    ///
    /// # Errors
    ///
    /// Returns an error if sending fails.
    pub async fn reply_to_message(
        &self,
        message: &Message,
        reply: &Reply,
    ) -> Result<(), TelegramError> {
        let chat_id = message_chat_id(message);
        self.rate_limiter.wait_and_acquire(chat_id).await;

        let result = message.respond(build_message(reply)).await;
        self.check_sent(chat_id, result.map(|_| ())).await
    }

    /// Delivers a reply to an inline button press.
    ///
    /// # Errors
    ///
    /// Returns an error if answering the callback fails.
    pub async fn reply_to_callback(
        &self,
        query: &CallbackQuery,
        reply: &Reply,
    ) -> Result<(), TelegramError> {
        let chat_id = callback_chat_id(query);

        let result = match reply.mode {
            ReplyMode::Alert => query.answer().text(&reply.text).send().await,
            ReplyMode::Edit => query.answer().edit(build_message(reply)).await,
            ReplyMode::Send => {
                self.rate_limiter.wait_and_acquire(chat_id).await;
                query.answer().respond(build_message(reply)).await.map(|_| ())
            }
        };
        self.check_sent(chat_id, result).await
    }

    async fn check_sent(
        &self,
        chat_id: i64,
        result: Result<(), InvocationError>,
    ) -> Result<(), TelegramError> {
        match result {
            Ok(()) => Ok(()),
            Err(e) => {
                let err: TelegramError = e.into();
                if let TelegramError::FloodWait(seconds) = &err {
                    self.rate_limiter.handle_flood_wait(chat_id, *seconds).await;
                }
                Err(err)
            }
        }
    }

    /// Drops rate-limiter entries for idle chats.
    pub async fn prune_rate_limits(&self) {
        self.rate_limiter.prune().await;
    }

    /// Disconnects from Telegram.
    pub fn disconnect(&self) {
        info!("Disconnecting from Telegram...");
        self.handle.quit();
    }
}

impl std::fmt::Debug for CatalogueBot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogueBot")
            .field("rate_limiter", &self.rate_limiter)
            .finish_non_exhaustive()
    }
}

/// Chat a message was sent in; conversation state is keyed by it.
pub fn message_chat_id(message: &Message) -> i64 {
    message.chat().id()
}

/// Chat an inline button was pressed in.
pub fn callback_chat_id(query: &CallbackQuery) -> i64 {
    query.chat().id()
}

/// Converts a router reply into an outgoing message with its keyboard.
fn build_message(reply: &Reply) -> InputMessage {
    let message = InputMessage::html(&reply.text);

    match &reply.keyboard {
        Keyboard::None => message,
        Keyboard::MainMenu => {
            let rows = MenuCommand::main_menu()
                .into_iter()
                .map(|row| row.into_iter().map(button::text).collect())
                .collect();
            message.reply_markup(&reply_markup::keyboard(rows).fit_size())
        }
        Keyboard::Remove => message.reply_markup(&reply_markup::hide()),
        Keyboard::Inline(rows) => {
            let rows = rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|b| button::inline(&b.text, b.data.as_bytes()))
                        .collect()
                })
                .collect();
            message.reply_markup(&reply_markup::inline(rows))
        }
    }
}

/// Logs a delivery failure without interrupting the update loop.
pub fn log_delivery_error(chat_id: i64, err: &TelegramError) {
    match err {
        TelegramError::FloodWait(seconds) => {
            warn!("Flood wait for chat {}: {} seconds", chat_id, seconds);
        }
        other => error!("Failed to deliver reply to chat {}: {}", chat_id, other),
    }
}
