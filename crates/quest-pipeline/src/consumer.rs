//! Queue consumer
//!
//! Pulls notification messages in batches (batch size 1 in the provisioned
//! configuration, i.e. strictly serial processing), runs the analytics task
//! for each, and deletes a message only when its run completed without error.
//! A failed or timed-out run leaves the message in flight; it becomes visible
//! again after the visibility timeout and is redelivered.

use anyhow::Result;
use quest_common::types::NotificationEvent;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};
use tracing::{error, info, warn};

use crate::analytics::AnalyticsTask;
use crate::queue::NotificationQueue;
use crate::store::ObjectStore;

/// Consumer loop settings
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    /// Messages pulled per poll
    pub batch_size: usize,
    /// Upper bound on one analytics run; must stay below the queue's
    /// visibility timeout
    pub task_timeout: Duration,
    /// Idle delay between polls when the queue is empty
    pub poll_interval: Duration,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            batch_size: 1,
            task_timeout: Duration::from_secs(900),
            poll_interval: Duration::from_secs(1),
        }
    }
}

/// Drives the analytics task from the notification queue
pub struct Consumer {
    queue: Arc<NotificationQueue<NotificationEvent>>,
    store: Arc<dyn ObjectStore>,
    task: AnalyticsTask,
    config: ConsumerConfig,
}

impl Consumer {
    pub fn new(
        queue: Arc<NotificationQueue<NotificationEvent>>,
        store: Arc<dyn ObjectStore>,
        task: AnalyticsTask,
        config: ConsumerConfig,
    ) -> Self {
        Self {
            queue,
            store,
            task,
            config,
        }
    }

    /// Receive one batch and process it. Returns the number of messages
    /// processed successfully (and therefore deleted).
    pub async fn poll_once(&self) -> Result<usize> {
        let deliveries = self.queue.receive(self.config.batch_size);
        let mut processed = 0;

        for delivery in deliveries {
            info!(
                message_id = %delivery.message_id,
                key = %delivery.body.key,
                receive_count = delivery.receive_count,
                "Processing notification"
            );

            let run = timeout(
                self.config.task_timeout,
                self.task.run(self.store.as_ref(), &delivery.body),
            )
            .await;

            match run {
                Ok(Ok(_report)) => {
                    self.queue.delete(delivery.receipt_handle)?;
                    processed += 1;
                    info!(message_id = %delivery.message_id, "Message processed and deleted");
                },
                Ok(Err(e)) => {
                    // Leave the message; it becomes visible again after the
                    // visibility timeout
                    warn!(
                        message_id = %delivery.message_id,
                        error = ?e,
                        "Analytics run failed, message left for redelivery"
                    );
                },
                Err(_) => {
                    warn!(
                        message_id = %delivery.message_id,
                        timeout_secs = self.config.task_timeout.as_secs(),
                        "Analytics run timed out, message left for redelivery"
                    );
                },
            }
        }

        Ok(processed)
    }

    /// Start the consumer loop.
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(batch_size = self.config.batch_size, "Consumer started");

            loop {
                match self.poll_once().await {
                    Ok(0) => tokio::time::sleep(self.config.poll_interval).await,
                    Ok(_) => {},
                    Err(e) => {
                        error!(error = ?e, "Consumer poll failed");
                        tokio::time::sleep(self.config.poll_interval).await;
                    },
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalyticsConfig;
    use crate::notify::OBJECT_STORE_SENDER;
    use crate::queue::{QueueConfig, QueuePolicy};
    use crate::store::{MemoryStore, PutOptions};
    use quest_common::types::{BLS_CURRENT_KEY, POPULATION_KEY};

    const BLS_SAMPLE: &str = "series_id\tyear\tperiod\tvalue\tfootnote_codes\n\
        PRS30006032\t2018\tQ01\t1.9\t\n";

    fn test_queue() -> Arc<NotificationQueue<NotificationEvent>> {
        Arc::new(NotificationQueue::new(
            QueueConfig {
                visibility_timeout: Duration::from_secs(910),
                max_receive_count: 5,
            },
            QueuePolicy::new(OBJECT_STORE_SENDER, "quest-bucket"),
        ))
    }

    fn consumer(
        queue: Arc<NotificationQueue<NotificationEvent>>,
        store: Arc<dyn ObjectStore>,
    ) -> Consumer {
        Consumer::new(
            queue,
            store,
            AnalyticsTask::new(AnalyticsConfig::default()),
            ConsumerConfig::default(),
        )
    }

    async fn seeded_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store
            .put(
                POPULATION_KEY,
                br#"[{"year":2018,"population":327167439}]"#.to_vec(),
                PutOptions::default(),
            )
            .await
            .unwrap();
        store
            .put(BLS_CURRENT_KEY, BLS_SAMPLE.as_bytes().to_vec(), PutOptions::default())
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_successful_run_deletes_message() {
        let queue = test_queue();
        let store = seeded_store().await;
        queue
            .send(
                OBJECT_STORE_SENDER,
                "quest-bucket",
                NotificationEvent::created(POPULATION_KEY),
            )
            .unwrap();

        let consumer = consumer(queue.clone(), store);
        let processed = consumer.poll_once().await.unwrap();

        assert_eq!(processed, 1);
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_failed_run_leaves_message() {
        let queue = test_queue();
        // Empty store: analytics cannot load its inputs and fails
        let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
        queue
            .send(
                OBJECT_STORE_SENDER,
                "quest-bucket",
                NotificationEvent::created(POPULATION_KEY),
            )
            .unwrap();

        let consumer = consumer(queue.clone(), store);
        let processed = consumer.poll_once().await.unwrap();

        assert_eq!(processed, 0);
        // Message survives, invisible until the visibility timeout
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.visible_len(), 0);
    }

    #[tokio::test]
    async fn test_poll_respects_batch_size() {
        let queue = test_queue();
        let store = seeded_store().await;
        for _ in 0..3 {
            queue
                .send(
                    OBJECT_STORE_SENDER,
                    "quest-bucket",
                    NotificationEvent::created(POPULATION_KEY),
                )
                .unwrap();
        }

        let consumer = consumer(queue.clone(), store);
        assert_eq!(consumer.poll_once().await.unwrap(), 1);
        assert_eq!(queue.len(), 2);
    }
}
