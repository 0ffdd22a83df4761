//! Write-notification dispatch
//!
//! The object store evaluates every completed write against a static
//! prefix/suffix rule and, on match, publishes exactly one notification
//! message to the queue. [`Dispatcher`] wraps any [`ObjectStore`] and adds
//! that behavior; the queue's access policy still applies, so dispatch fails
//! loudly when the wiring is misconfigured rather than dropping events.

use async_trait::async_trait;
use quest_common::types::{NotificationEvent, POPULATION_PREFIX};
use quest_common::Result;
use std::sync::Arc;
use tracing::{debug, info};

use crate::queue::NotificationQueue;
use crate::store::{ObjectMeta, ObjectStore, PutOptions};

/// Principal name the dispatcher sends queue messages as
pub const OBJECT_STORE_SENDER: &str = "object-store";

/// Static key filter for write notifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRule {
    pub prefix: String,
    pub suffix: String,
}

impl NotificationRule {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    pub fn matches(&self, key: &str) -> bool {
        key.starts_with(&self.prefix) && key.ends_with(&self.suffix)
    }
}

impl Default for NotificationRule {
    /// The provisioned filter: population artifacts written as JSON
    fn default() -> Self {
        Self::new(POPULATION_PREFIX, ".json")
    }
}

/// [`ObjectStore`] wrapper that publishes a notification for every write
/// matching the rule.
///
/// Writes land in the inner store first; the notification is published only
/// after the write succeeded, so consumers never see events for failed
/// writes. `copy` counts as a write of the destination key, which is what
/// makes staged atomic publishes emit a single event for the final key.
pub struct Dispatcher<S> {
    store: S,
    rule: NotificationRule,
    queue: Arc<NotificationQueue<NotificationEvent>>,
    /// Source the dispatcher acts for, checked against the queue policy
    source: String,
}

impl<S: ObjectStore> Dispatcher<S> {
    pub fn new(
        store: S,
        rule: NotificationRule,
        queue: Arc<NotificationQueue<NotificationEvent>>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            store,
            rule,
            queue,
            source: source.into(),
        }
    }

    pub fn rule(&self) -> &NotificationRule {
        &self.rule
    }

    fn dispatch(&self, key: &str) -> Result<()> {
        if !self.rule.matches(key) {
            debug!(key, "Write did not match notification rule");
            return Ok(());
        }

        let event = NotificationEvent::created(key);
        let message_id = self
            .queue
            .send(OBJECT_STORE_SENDER, &self.source, event)?;

        info!(key, %message_id, "Dispatched write notification");
        Ok(())
    }
}

#[async_trait]
impl<S: ObjectStore> ObjectStore for Dispatcher<S> {
    async fn put(&self, key: &str, data: Vec<u8>, opts: PutOptions) -> Result<ObjectMeta> {
        let meta = self.store.put(key, data, opts).await?;
        self.dispatch(key)?;
        Ok(meta)
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        self.store.get(key).await
    }

    async fn head(&self, key: &str) -> Result<Option<ObjectMeta>> {
        self.store.head(key).await
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        self.store.list(prefix).await
    }

    async fn copy(&self, source_key: &str, dest_key: &str) -> Result<()> {
        self.store.copy(source_key, dest_key).await?;
        self.dispatch(dest_key)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.store.delete(key).await
    }
}
