//! Scheduled ingest task
//!
//! One run syncs the BLS `pr` time-series files and then fetches the DataUSA
//! population series, writing both into the object store. Any fetch or write
//! failure surfaces as a task failure; the scheduler simply retries on the
//! next tick. Uploads are deduplicated by MD5 and the population artifact is
//! published with a staged write, so readers never observe truncated data.

use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::IngestConfig;
use crate::store::ObjectStore;

pub mod bls;
pub mod population;

pub use bls::BlsSync;
pub use population::PopulationFetcher;

/// Counters for a single ingest run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub bls_uploaded: usize,
    pub bls_skipped: usize,
    pub population_rows: usize,
}

/// The scheduled ingest task
pub struct IngestTask {
    bls: BlsSync,
    population: PopulationFetcher,
    population_key: String,
}

impl IngestTask {
    pub fn new(config: IngestConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            bls: BlsSync::new(client.clone(), config.clone()),
            population: PopulationFetcher::new(client, config.clone()),
            population_key: config.population_key,
        })
    }

    /// Run one full ingest: BLS sync, then population fetch + publish.
    pub async fn run(&self, store: &dyn ObjectStore) -> Result<IngestSummary> {
        info!("Starting ingest run");

        let bls_stats = self
            .bls
            .sync(store)
            .await
            .context("BLS sync failed")?;
        info!(
            uploaded = bls_stats.uploaded,
            skipped = bls_stats.skipped,
            "Finished BLS sync"
        );

        let rows = self
            .population
            .fetch()
            .await
            .context("Population fetch failed")?;

        let population_rows = rows.len();
        if rows.is_empty() {
            warn!("No population rows fetched from API, skipping publish");
        } else {
            self.population
                .publish(store, &self.population_key, &rows)
                .await
                .context("Population publish failed")?;
            info!(
                rows = population_rows,
                key = %self.population_key,
                "Saved population artifact"
            );
        }

        info!("Ingest run completed");

        Ok(IngestSummary {
            bls_uploaded: bls_stats.uploaded,
            bls_skipped: bls_stats.skipped,
            population_rows,
        })
    }
}
