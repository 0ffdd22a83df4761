//! `quest analyze` - one-shot analytics run

use anyhow::{Context, Result};
use quest_common::types::NotificationEvent;
use quest_pipeline::analytics::AnalyticsTask;
use quest_pipeline::config::PipelineConfig;
use quest_pipeline::store::{S3Config, S3Store};

pub async fn run(config: &PipelineConfig, key: Option<String>, pretty: bool) -> Result<()> {
    let store = S3Store::new(S3Config::from_env().context("Invalid storage configuration")?);
    let task = AnalyticsTask::new(config.analytics.clone());

    let key = key.unwrap_or_else(|| config.analytics.population_key.clone());
    let report = task.run(&store, &NotificationEvent::created(key)).await?;

    let json = if pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");

    Ok(())
}
