//! Per-chat delivery queues.
//!
//! Each chat gets its own worker task that runs that chat's deliveries in
//! order. A chat that is sleeping through its rate limit or a flood wait
//! only holds up its own queue.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tracing::debug;

use super::ChatId;

/// A boxed delivery job.
type Job = Pin<Box<dyn Future<Output = ()> + Send>>;

type Queues = Arc<Mutex<HashMap<ChatId, mpsc::UnboundedSender<Job>>>>;

/// Ordered per-chat job queues.
pub struct DeliveryQueues {
    /// Live queue senders, keyed by chat.
    queues: Queues,

    /// How long a worker waits for new jobs before shutting down.
    idle_timeout: Duration,
}

impl DeliveryQueues {
    /// Creates empty queues whose workers exit after `idle_timeout` without jobs.
    #[must_use]
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            queues: Arc::new(Mutex::new(HashMap::new())),
            idle_timeout,
        }
    }

    /// Queues `job` behind any pending deliveries to `chat_id`.
    pub async fn push<F>(&self, chat_id: ChatId, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut job: Job = Box::pin(job);
        let mut queues = self.queues.lock().await;

        if let Some(tx) = queues.get(&chat_id) {
            match tx.send(job) {
                Ok(()) => return,
                // The worker is gone; start a fresh one below.
                Err(mpsc::error::SendError(returned)) => job = returned,
            }
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(job);
        queues.insert(chat_id, tx);
        tokio::spawn(run_queue(
            chat_id,
            rx,
            Arc::clone(&self.queues),
            self.idle_timeout,
        ));
    }

    /// Number of chats with a running worker.
    pub async fn active_chats(&self) -> usize {
        self.queues.lock().await.len()
    }
}

impl std::fmt::Debug for DeliveryQueues {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryQueues")
            .field("idle_timeout", &self.idle_timeout)
            .finish_non_exhaustive()
    }
}

async fn run_queue(
    chat_id: ChatId,
    mut rx: mpsc::UnboundedReceiver<Job>,
    queues: Queues,
    idle_timeout: Duration,
) {
    loop {
        match tokio::time::timeout(idle_timeout, rx.recv()).await {
            Ok(Some(job)) => job.await,
            Ok(None) => break,
            Err(_) => {
                let mut queues = queues.lock().await;
                // A job may have been pushed while we waited for the lock.
                if let Ok(job) = rx.try_recv() {
                    drop(queues);
                    job.await;
                } else {
                    queues.remove(&chat_id);
                    break;
                }
            }
        }
    }
    debug!("Delivery queue for chat {} closed", chat_id);
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use tokio::sync::oneshot;

    use super::*;
    use crate::telegram::RateLimiter;

    #[tokio::test]
    async fn test_flood_waiting_chat_does_not_block_others() {
        let limiter = Arc::new(RateLimiter::from_millis(10));
        limiter.handle_flood_wait(1, 30).await;
        let queues = DeliveryQueues::new(Duration::from_secs(60));

        let delivered_first = Arc::new(AtomicBool::new(false));
        queues
            .push(1, {
                let limiter = Arc::clone(&limiter);
                let delivered = Arc::clone(&delivered_first);
                async move {
                    limiter.wait_and_acquire(1).await;
                    delivered.store(true, Ordering::SeqCst);
                }
            })
            .await;

        let (tx, rx) = oneshot::channel();
        queues
            .push(2, {
                let limiter = Arc::clone(&limiter);
                async move {
                    limiter.wait_and_acquire(2).await;
                    let _ = tx.send(());
                }
            })
            .await;

        let second = tokio::time::timeout(Duration::from_secs(1), rx).await;
        assert!(matches!(second, Ok(Ok(()))));
        assert!(!delivered_first.load(Ordering::SeqCst));
        assert_eq!(queues.active_chats().await, 2);
    }

    #[tokio::test]
    async fn test_jobs_for_one_chat_run_in_order() {
        let queues = DeliveryQueues::new(Duration::from_secs(60));
        let order = Arc::new(Mutex::new(Vec::new()));

        for (i, delay) in [30u64, 10, 0].into_iter().enumerate() {
            let order = Arc::clone(&order);
            queues
                .push(7, async move {
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    order.lock().await.push(i);
                })
                .await;
        }

        let (tx, rx) = oneshot::channel();
        queues
            .push(7, async move {
                let _ = tx.send(());
            })
            .await;
        rx.await.unwrap();

        assert_eq!(*order.lock().await, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_idle_queue_closes_and_restarts() {
        let queues = DeliveryQueues::new(Duration::from_millis(20));

        queues.push(3, async {}).await;
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(queues.active_chats().await, 0);

        let (tx, rx) = oneshot::channel();
        queues
            .push(3, async move {
                let _ = tx.send(());
            })
            .await;
        rx.await.unwrap();
    }
}
