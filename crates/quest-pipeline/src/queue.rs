//! Notification queue
//!
//! Durable at-least-once message buffer decoupling the object store from the
//! analytics consumer. Semantics follow the standard queue contract:
//!
//! - `send` appends a message, but only for the sender/source pair allowed by
//!   the [`QueuePolicy`]
//! - `receive` hands out up to N visible messages and hides each one until its
//!   visibility deadline passes
//! - `delete` removes a message by its current receipt handle; an undeleted
//!   message becomes visible again after the timeout and is redelivered
//! - a message received more than `max_receive_count` times without being
//!   deleted is moved to the dead-letter queue, a terminal state
//!
//! There is no ordering guarantee across messages. Time is driven by
//! `tokio::time::Instant`, so tests can pause and advance the clock.

use chrono::{DateTime, Utc};
use quest_common::{QuestError, Result};
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::time::{Duration, Instant};
use uuid::Uuid;

/// Default visibility timeout. Must stay above the consumer task timeout so a
/// message is never redelivered while a consumer is still working on it.
pub const DEFAULT_VISIBILITY_TIMEOUT_SECS: u64 = 910;

/// Default number of receives before a message is dead-lettered.
pub const DEFAULT_MAX_RECEIVE_COUNT: u32 = 5;

/// Delivery settings for a queue
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// How long a received message stays invisible before redelivery
    pub visibility_timeout: Duration,
    /// Receives allowed before a message moves to the dead-letter queue
    pub max_receive_count: u32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            visibility_timeout: Duration::from_secs(DEFAULT_VISIBILITY_TIMEOUT_SECS),
            max_receive_count: DEFAULT_MAX_RECEIVE_COUNT,
        }
    }
}

/// Access policy restricting who may send to the queue.
///
/// Mirrors the queue access policy of the provisioned pipeline: only the
/// object-store dispatcher, acting for the configured source bucket, may
/// publish notification messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuePolicy {
    pub allowed_sender: String,
    pub allowed_source: String,
}

impl QueuePolicy {
    pub fn new(allowed_sender: impl Into<String>, allowed_source: impl Into<String>) -> Self {
        Self {
            allowed_sender: allowed_sender.into(),
            allowed_source: allowed_source.into(),
        }
    }

    fn authorize(&self, sender: &str, source: &str) -> Result<()> {
        if sender == self.allowed_sender && source == self.allowed_source {
            Ok(())
        } else {
            Err(QuestError::AccessDenied(format!(
                "sender '{sender}' from source '{source}' may not send to this queue"
            )))
        }
    }
}

/// One received message, valid until its visibility deadline
#[derive(Debug, Clone)]
pub struct Delivery<T> {
    pub message_id: Uuid,
    /// Handle for this delivery; a redelivery gets a fresh handle
    pub receipt_handle: Uuid,
    pub body: T,
    pub receive_count: u32,
    pub sent_at: DateTime<Utc>,
}

/// A message that exhausted its receives
#[derive(Debug, Clone)]
pub struct DeadLetter<T> {
    pub message_id: Uuid,
    pub body: T,
    pub receive_count: u32,
}

#[derive(Debug)]
struct Slot<T> {
    id: Uuid,
    body: T,
    receive_count: u32,
    visible_at: Instant,
    receipt: Option<Uuid>,
    sent_at: DateTime<Utc>,
}

#[derive(Debug)]
struct Inner<T> {
    messages: VecDeque<Slot<T>>,
    dead_letters: Vec<DeadLetter<T>>,
}

/// In-process queue with standard durable-queue delivery semantics
pub struct NotificationQueue<T> {
    config: QueueConfig,
    policy: QueuePolicy,
    inner: Mutex<Inner<T>>,
}

impl<T: Clone + Send> NotificationQueue<T> {
    pub fn new(config: QueueConfig, policy: QueuePolicy) -> Self {
        Self {
            config,
            policy,
            inner: Mutex::new(Inner {
                messages: VecDeque::new(),
                dead_letters: Vec::new(),
            }),
        }
    }

    /// Enqueue a message on behalf of `sender` acting for `source`.
    ///
    /// Fails with [`QuestError::AccessDenied`] when the policy does not allow
    /// the pair; a policy failure is a configuration error, not retryable.
    pub fn send(&self, sender: &str, source: &str, body: T) -> Result<Uuid> {
        self.policy.authorize(sender, source)?;

        let id = Uuid::new_v4();
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.messages.push_back(Slot {
            id,
            body,
            receive_count: 0,
            visible_at: Instant::now(),
            receipt: None,
            sent_at: Utc::now(),
        });

        Ok(id)
    }

    /// Receive up to `max_messages` visible messages.
    ///
    /// Each returned message is hidden until the visibility deadline. A
    /// message whose receive count would exceed the configured maximum is
    /// dead-lettered instead of delivered.
    pub fn receive(&self, max_messages: usize) -> Vec<Delivery<T>> {
        let now = Instant::now();
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let mut deliveries = Vec::new();

        let mut index = 0;
        while index < inner.messages.len() && deliveries.len() < max_messages {
            if inner.messages[index].visible_at > now {
                index += 1;
                continue;
            }

            if inner.messages[index].receive_count >= self.config.max_receive_count {
                // remove() preserves relative order of the rest
                if let Some(slot) = inner.messages.remove(index) {
                    tracing::warn!(
                        message_id = %slot.id,
                        receive_count = slot.receive_count,
                        "Message exhausted receives, moving to dead-letter queue"
                    );
                    inner.dead_letters.push(DeadLetter {
                        message_id: slot.id,
                        body: slot.body,
                        receive_count: slot.receive_count,
                    });
                }
                continue;
            }

            let slot = &mut inner.messages[index];
            slot.receive_count += 1;
            slot.visible_at = now + self.config.visibility_timeout;
            let receipt = Uuid::new_v4();
            slot.receipt = Some(receipt);

            deliveries.push(Delivery {
                message_id: slot.id,
                receipt_handle: receipt,
                body: slot.body.clone(),
                receive_count: slot.receive_count,
                sent_at: slot.sent_at,
            });

            index += 1;
        }

        deliveries
    }

    /// Delete a message by the receipt handle of its latest delivery.
    ///
    /// A stale handle (the message timed out and was redelivered, or was
    /// already deleted) is rejected.
    pub fn delete(&self, receipt_handle: Uuid) -> Result<()> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());

        let position = inner
            .messages
            .iter()
            .position(|slot| slot.receipt == Some(receipt_handle));

        match position {
            Some(index) => {
                inner.messages.remove(index);
                Ok(())
            },
            None => Err(QuestError::MessageNotFound(receipt_handle.to_string())),
        }
    }

    /// Total messages in the main queue (visible or in flight)
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .messages
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Messages currently eligible for delivery
    pub fn visible_len(&self) -> usize {
        let now = Instant::now();
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .messages
            .iter()
            .filter(|slot| slot.visible_at <= now)
            .count()
    }

    /// Snapshot of the dead-letter queue
    pub fn dead_letters(&self) -> Vec<DeadLetter<T>> {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .dead_letters
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_queue() -> NotificationQueue<String> {
        NotificationQueue::new(
            QueueConfig {
                visibility_timeout: Duration::from_secs(910),
                max_receive_count: 3,
            },
            QueuePolicy::new("object-store", "quest-bucket"),
        )
    }

    fn send_ok(queue: &NotificationQueue<String>, body: &str) -> Uuid {
        queue
            .send("object-store", "quest-bucket", body.to_string())
            .unwrap()
    }

    #[tokio::test]
    async fn test_send_receive_delete() {
        let queue = test_queue();
        let id = send_ok(&queue, "event");

        let deliveries = queue.receive(10);
        assert_eq!(deliveries.len(), 1);
        assert_eq!(deliveries[0].message_id, id);
        assert_eq!(deliveries[0].body, "event");
        assert_eq!(deliveries[0].receive_count, 1);

        queue.delete(deliveries[0].receipt_handle).unwrap();
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn test_policy_denies_unknown_sender() {
        let queue = test_queue();

        let err = queue
            .send("some-other-service", "quest-bucket", "event".to_string())
            .unwrap_err();
        assert!(matches!(err, QuestError::AccessDenied(_)));

        let err = queue
            .send("object-store", "another-bucket", "event".to_string())
            .unwrap_err();
        assert!(matches!(err, QuestError::AccessDenied(_)));

        assert!(queue.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_received_message_is_invisible_until_timeout() {
        let queue = test_queue();
        send_ok(&queue, "event");

        let first = queue.receive(10);
        assert_eq!(first.len(), 1);

        // Still in flight, nothing visible
        assert!(queue.receive(10).is_empty());
        assert_eq!(queue.len(), 1);

        tokio::time::advance(Duration::from_secs(909)).await;
        assert!(queue.receive(10).is_empty());

        tokio::time::advance(Duration::from_secs(2)).await;
        let redelivered = queue.receive(10);
        assert_eq!(redelivered.len(), 1);
        assert_eq!(redelivered[0].receive_count, 2);
        assert_ne!(redelivered[0].receipt_handle, first[0].receipt_handle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_receipt_is_rejected() {
        let queue = test_queue();
        send_ok(&queue, "event");

        let first = queue.receive(1);
        tokio::time::advance(Duration::from_secs(911)).await;
        let second = queue.receive(1);
        assert_eq!(second.len(), 1);

        let err = queue.delete(first[0].receipt_handle).unwrap_err();
        assert!(matches!(err, QuestError::MessageNotFound(_)));

        queue.delete(second[0].receipt_handle).unwrap();
        assert!(queue.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_poison_message_moves_to_dead_letter_queue() {
        let queue = test_queue();
        let id = send_ok(&queue, "poison");

        // Three failed deliveries (max_receive_count = 3)
        for attempt in 1..=3u32 {
            let deliveries = queue.receive(1);
            assert_eq!(deliveries.len(), 1, "attempt {attempt}");
            assert_eq!(deliveries[0].receive_count, attempt);
            tokio::time::advance(Duration::from_secs(911)).await;
        }

        // Fourth receive dead-letters instead of delivering
        assert!(queue.receive(1).is_empty());
        assert!(queue.is_empty());

        let dead = queue.dead_letters();
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].message_id, id);
        assert_eq!(dead[0].receive_count, 3);
    }

    #[tokio::test]
    async fn test_batch_size_limits_receive() {
        let queue = test_queue();
        for i in 0..3 {
            send_ok(&queue, &format!("event-{i}"));
        }

        let batch = queue.receive(1);
        assert_eq!(batch.len(), 1);
        assert_eq!(queue.visible_len(), 2);
    }
}
