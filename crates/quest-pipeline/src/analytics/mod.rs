//! Queue-triggered analytics task
//!
//! Invoked once per queue message. Reads the BLS artifact and the population
//! artifact (the latter unconditionally, regardless of which key triggered
//! the run), computes the derived reports, logs them, and returns the result.
//! The task is idempotent: rerunning it for the same key with unchanged
//! artifacts produces the same report and no other side effects, which is
//! what makes at-least-once delivery safe.

use anyhow::{Context, Result};
use quest_common::types::NotificationEvent;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::AnalyticsConfig;
use crate::store::ObjectStore;

pub mod loader;
pub mod report;

pub use report::{BestYear, PopulationStats, SeriesPopulationRow};

/// Everything one analytics run computes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    /// Key of the write that triggered this run
    pub triggered_by: String,
    pub population_stats: Option<PopulationStats>,
    pub best_years: Vec<BestYear>,
    pub series_population: Vec<SeriesPopulationRow>,
}

/// The analytics task
#[derive(Debug, Clone)]
pub struct AnalyticsTask {
    config: AnalyticsConfig,
}

impl AnalyticsTask {
    pub fn new(config: AnalyticsConfig) -> Self {
        Self { config }
    }

    /// Run analytics for one notification event.
    pub async fn run(
        &self,
        store: &dyn ObjectStore,
        event: &NotificationEvent,
    ) -> Result<AnalyticsReport> {
        info!(
            key = %event.key,
            event_type = %event.event_type,
            "Analytics task triggered"
        );

        let population_blob = store
            .get(&self.config.population_key)
            .await
            .with_context(|| format!("Failed to load {}", self.config.population_key))?;
        let by_year = loader::parse_population(&population_blob)?;
        info!(rows = by_year.len(), "Loaded population artifact");

        let bls_blob = store
            .get(&self.config.bls_key)
            .await
            .with_context(|| format!("Failed to load {}", self.config.bls_key))?;
        let bls_rows = loader::parse_bls(&bls_blob)?;
        info!(rows = bls_rows.len(), "Loaded BLS artifact");

        let population_stats = report::population_stats(&by_year);
        match &population_stats {
            Some(stats) => info!(
                mean = stats.mean as i64,
                std_dev = format!("{:.2}", stats.std_dev),
                "Population {}-{} statistics",
                report::STATS_START_YEAR,
                report::STATS_END_YEAR
            ),
            None => warn!(
                "Not enough population data for {}-{} to compute stats",
                report::STATS_START_YEAR,
                report::STATS_END_YEAR
            ),
        }

        let best_years = report::best_years(&bls_rows);
        info!(series = best_years.len(), "Computed best year per series");
        for best in best_years.iter().take(5) {
            info!(
                series_id = %best.series_id,
                year = best.year,
                total = format!("{:.4}", best.total),
                "Best year sample"
            );
        }

        let series_population = report::series_population(&bls_rows, &by_year);
        info!(
            rows = series_population.len(),
            "Computed {} {} report",
            report::REPORT_SERIES_ID,
            report::REPORT_PERIOD
        );
        for row in series_population.iter().take(5) {
            info!(
                year = row.year,
                value = format!("{:.4}", row.value),
                population = ?row.population,
                "Series report sample"
            );
        }

        Ok(AnalyticsReport {
            triggered_by: event.key.clone(),
            population_stats,
            best_years,
            series_population,
        })
    }
}
