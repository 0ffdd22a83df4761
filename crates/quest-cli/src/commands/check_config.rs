//! `quest check-config` - validate and print the effective configuration

use anyhow::Result;
use quest_pipeline::config::PipelineConfig;

pub fn run(config: &PipelineConfig) -> Result<()> {
    println!("Configuration is valid.");
    println!();
    println!("  Bucket:              {}", config.bucket);
    println!("  BLS base:            {}", config.ingest.bls_base);
    println!("  Population URL:      {}", config.ingest.population_url);
    println!("  Population key:      {}", config.ingest.population_key);
    println!("  BLS key:             {}", config.analytics.bls_key);
    println!("  Schedule period:     {}s", config.schedule_period_secs);
    println!("  Task timeout:        {}s", config.task_timeout_secs);
    println!(
        "  Visibility timeout:  {}s",
        config.queue.visibility_timeout_secs
    );
    println!("  Max receive count:   {}", config.queue.max_receive_count);
    println!("  Consumer batch size: {}", config.batch_size);

    Ok(())
}
