//! Update loop.
//!
//! Pulls updates off the bot's queue and routes them one at a time, so a
//! user's messages reach the conversation state in arrival order. Replies
//! are handed to per-chat delivery queues; a chat waiting out its rate
//! limit never stalls the loop.

use std::sync::Arc;
use std::time::Duration;

use grammers_client::update::Update;
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{debug, info, warn};

use super::client::{callback_chat_id, log_delivery_error, message_chat_id};
use super::{CatalogueBot, DeliveryQueues, TelegramError};
use crate::commands::{Event, Router};

/// How often idle chats are dropped from the rate limiter.
const PRUNE_INTERVAL: Duration = Duration::from_secs(300);

/// How long a chat's delivery worker lingers without new replies.
const DELIVERY_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Messages that can be sent to the runner.
#[derive(Debug, Clone)]
pub enum RunnerMessage {
    /// Stop the update loop.
    Shutdown,
}

/// Serves Telegram updates through a [`Router`].
pub struct UpdateRunner {
    /// Telegram bot client.
    bot: Arc<CatalogueBot>,

    /// Event router.
    router: Arc<Router>,

    /// Outgoing replies, queued per chat.
    deliveries: DeliveryQueues,
}

impl UpdateRunner {
    /// Creates a new runner.
    #[must_use]
    pub fn new(bot: Arc<CatalogueBot>, router: Arc<Router>) -> Self {
        Self {
            bot,
            router,
            deliveries: DeliveryQueues::new(DELIVERY_IDLE_TIMEOUT),
        }
    }

    /// Runs the update loop until shutdown or until the update stream ends.
    ///
    /// # Errors
    ///
    /// Returns an error if the bot's update queue was already taken.
    pub async fn run(&self, mut rx: mpsc::Receiver<RunnerMessage>) -> Result<(), TelegramError> {
        let mut updates = self.bot.take_updates().await?;
        let mut prune_timer = interval(PRUNE_INTERVAL);

        info!("Update runner started");

        loop {
            tokio::select! {
                update = updates.recv() => {
                    let Some(update) = update else {
                        warn!("Update stream closed");
                        break;
                    };
                    self.dispatch(update).await;
                }
                _ = prune_timer.tick() => {
                    self.bot.prune_rate_limits().await;
                }
                msg = rx.recv() => {
                    match msg {
                        Some(RunnerMessage::Shutdown) | None => {
                            info!("Update runner shutting down");
                            break;
                        }
                    }
                }
            }
        }

        Ok(())
    }

    async fn dispatch(&self, update: Update) {
        match update {
            Update::NewMessage(message) if !message.outgoing() => {
                let chat_id = message_chat_id(&message);
                let event = Event::Message {
                    user_id: chat_id,
                    text: message.text().to_owned(),
                };
                let reply = self.router.handle(event).await;
                let bot = Arc::clone(&self.bot);
                self.deliveries
                    .push(chat_id, async move {
                        if let Err(e) = bot.reply_to_message(&message, &reply).await {
                            log_delivery_error(chat_id, &e);
                        }
                    })
                    .await;
            }
            Update::CallbackQuery(query) => {
                let chat_id = callback_chat_id(&query);
                let event = Event::Callback {
                    user_id: chat_id,
                    data: query.data().to_vec(),
                };
                let reply = self.router.handle(event).await;
                let bot = Arc::clone(&self.bot);
                self.deliveries
                    .push(chat_id, async move {
                        if let Err(e) = bot.reply_to_callback(&query, &reply).await {
                            log_delivery_error(chat_id, &e);
                        }
                    })
                    .await;
            }
            _ => debug!("Ignoring update"),
        }
    }
}

impl std::fmt::Debug for UpdateRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateRunner")
            .field("bot", &self.bot)
            .field("router", &self.router)
            .field("deliveries", &self.deliveries)
            .finish()
    }
}
