//! Quest Pipeline Library
//!
//! Event-driven two-stage data pipeline: a scheduled ingest task syncs BLS
//! time-series files and the DataUSA population series into an object store;
//! writes matching a prefix/suffix rule are dispatched as notification events
//! onto a durable queue; a queue consumer runs the analytics task which joins
//! the two artifacts and computes derived statistics.
//!
//! # Components
//!
//! - [`store`]: object storage behind the [`store::ObjectStore`] trait
//!   (S3-compatible backend plus an in-process backend for tests)
//! - [`notify`]: write-notification rule evaluation and dispatch
//! - [`queue`]: at-least-once message queue with visibility timeout and a
//!   dead-letter destination
//! - [`ingest`]: the scheduled ingest task (BLS sync + population fetch)
//! - [`analytics`]: the queue-triggered analytics task
//! - [`scheduler`] / [`consumer`]: the loops gluing the stages together
//!
//! # Example
//!
//! ```no_run
//! use quest_pipeline::config::PipelineConfig;
//! use quest_pipeline::store::MemoryStore;
//! use quest_pipeline::ingest::IngestTask;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = PipelineConfig::load()?;
//!     let store = MemoryStore::new();
//!     let task = IngestTask::new(config.ingest.clone())?;
//!     task.run(&store).await?;
//!     Ok(())
//! }
//! ```

pub mod analytics;
pub mod config;
pub mod consumer;
pub mod ingest;
pub mod notify;
pub mod queue;
pub mod scheduler;
pub mod store;
