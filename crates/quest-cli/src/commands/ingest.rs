//! `quest ingest` - one-shot ingest run

use anyhow::{Context, Result};
use quest_pipeline::config::PipelineConfig;
use quest_pipeline::ingest::IngestTask;
use quest_pipeline::store::{S3Config, S3Store};

pub async fn run(config: &PipelineConfig) -> Result<()> {
    let store = S3Store::new(S3Config::from_env().context("Invalid storage configuration")?);
    let task = IngestTask::new(config.ingest.clone())?;

    let summary = task.run(&store).await?;

    println!("Ingest run completed:");
    println!("  BLS files uploaded: {}", summary.bls_uploaded);
    println!("  BLS files skipped:  {}", summary.bls_skipped);
    println!("  Population rows:    {}", summary.population_rows);

    Ok(())
}
