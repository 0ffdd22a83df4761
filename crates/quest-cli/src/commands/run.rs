//! `quest run` - both pipeline stages in one process
//!
//! Wires the S3 store behind the notification dispatcher, starts the ingest
//! schedule and the queue consumer, and runs until interrupted. This is the
//! local stand-in for the provisioned deployment, with the queue held
//! in-process.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::time::Duration;
use tracing::info;

use quest_pipeline::analytics::AnalyticsTask;
use quest_pipeline::config::PipelineConfig;
use quest_pipeline::consumer::{Consumer, ConsumerConfig};
use quest_pipeline::ingest::IngestTask;
use quest_pipeline::notify::{Dispatcher, NotificationRule, OBJECT_STORE_SENDER};
use quest_pipeline::queue::{NotificationQueue, QueueConfig, QueuePolicy};
use quest_pipeline::scheduler::Scheduler;
use quest_pipeline::store::{ObjectStore, S3Config, S3Store};

pub async fn run(config: &PipelineConfig) -> Result<()> {
    let queue = Arc::new(NotificationQueue::new(
        QueueConfig {
            visibility_timeout: Duration::from_secs(config.queue.visibility_timeout_secs),
            max_receive_count: config.queue.max_receive_count,
        },
        QueuePolicy::new(OBJECT_STORE_SENDER, &config.bucket),
    ));

    let s3 = S3Store::new(S3Config::from_env().context("Invalid storage configuration")?);
    let store: Arc<dyn ObjectStore> = Arc::new(Dispatcher::new(
        s3,
        NotificationRule::default(),
        queue.clone(),
        &config.bucket,
    ));

    let task_timeout = Duration::from_secs(config.task_timeout_secs);

    let ingest = Arc::new(IngestTask::new(config.ingest.clone())?);
    let scheduler = Scheduler::new(
        Duration::from_secs(config.schedule_period_secs),
        task_timeout,
    );
    let schedule_handle = scheduler.start(ingest, store.clone());

    let consumer = Consumer::new(
        queue,
        store,
        AnalyticsTask::new(config.analytics.clone()),
        ConsumerConfig {
            batch_size: config.batch_size,
            task_timeout,
            poll_interval: Duration::from_secs(1),
        },
    );
    let consumer_handle = consumer.start();

    info!(bucket = %config.bucket, "Pipeline running, press Ctrl+C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    info!("Shutting down");
    schedule_handle.abort();
    consumer_handle.abort();

    Ok(())
}
