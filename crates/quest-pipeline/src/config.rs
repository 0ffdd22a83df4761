//! Pipeline configuration
//!
//! Every task reads its configuration from the environment at invocation
//! time; there is no global mutable state. `PipelineConfig::load` merges
//! `.env` (via dotenvy) with process environment and validates the result.

use serde::{Deserialize, Serialize};

use quest_common::types::{BLS_CURRENT_KEY, POPULATION_KEY, POPULATION_PREFIX};

// ============================================================================
// Configuration Constants
// ============================================================================

/// Default base URL for the BLS `pr` time-series directory.
pub const DEFAULT_BLS_BASE: &str = "https://download.bls.gov/pub/time.series/pr/";

/// Default DataUSA endpoint for the national population series.
pub const DEFAULT_POPULATION_URL: &str = "https://honolulu-api.datausa.io/tesseract/data.jsonrecords?cube=acs_yg_total_population_1&drilldowns=Year%2CNation&locale=en&measures=Population";

/// User agent sent with every outbound request.
pub const DEFAULT_USER_AGENT: &str = "rearc-data-quest/1.0";

/// Default schedule period: one ingest run per day.
pub const DEFAULT_SCHEDULE_PERIOD_SECS: u64 = 86_400;

/// Default task timeout, matching the platform bound of the original tasks.
pub const DEFAULT_TASK_TIMEOUT_SECS: u64 = 900;

/// Default queue visibility timeout, deliberately just above the task timeout.
pub const DEFAULT_VISIBILITY_TIMEOUT_SECS: u64 = 910;

/// Default receives before a message is dead-lettered.
pub const DEFAULT_MAX_RECEIVE_COUNT: u32 = 5;

/// Default consumer batch size: strictly serial per-message processing.
pub const DEFAULT_BATCH_SIZE: usize = 1;

/// Default bounded retries for a single ingest download.
pub const DEFAULT_MAX_RETRIES: u32 = 6;

/// Default per-request timeout for ingest downloads, in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Top-level pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Destination bucket (`REARC_BUCKET`)
    pub bucket: String,
    pub ingest: IngestConfig,
    pub analytics: AnalyticsConfig,
    pub queue: QueueSettings,
    /// Seconds between schedule ticks driving the ingest task
    pub schedule_period_secs: u64,
    /// Upper bound on a single task invocation, in seconds
    pub task_timeout_secs: u64,
    /// Messages pulled per consumer poll
    pub batch_size: usize,
}

/// Ingest task configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Base URL for BLS source files (`BLS_BASE`)
    pub bls_base: String,
    /// Listing URL for BLS file discovery (`BLS_INDEX`, defaults to the base)
    pub bls_index: String,
    /// DataUSA population endpoint
    pub population_url: String,
    /// Destination key for the population artifact (`REARC_POP_KEY`)
    pub population_key: String,
    pub user_agent: String,
    pub max_retries: u32,
    pub request_timeout_secs: u64,
}

/// Analytics task configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// Source key for the BLS artifact (`BLS_KEY`)
    pub bls_key: String,
    /// Source key for the population artifact (`POP_KEY`), read
    /// unconditionally regardless of which key triggered the run
    pub population_key: String,
}

/// Queue delivery settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueSettings {
    pub visibility_timeout_secs: u64,
    pub max_receive_count: u32,
}

impl PipelineConfig {
    /// Load configuration from environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let bls_base = std::env::var("BLS_BASE").unwrap_or_else(|_| DEFAULT_BLS_BASE.to_string());

        let config = PipelineConfig {
            bucket: std::env::var("REARC_BUCKET")
                .map_err(|_| anyhow::anyhow!("REARC_BUCKET must be set"))?,
            ingest: IngestConfig {
                bls_index: std::env::var("BLS_INDEX").unwrap_or_else(|_| bls_base.clone()),
                bls_base,
                population_url: std::env::var("DATAUSA_URL")
                    .unwrap_or_else(|_| DEFAULT_POPULATION_URL.to_string()),
                population_key: std::env::var("REARC_POP_KEY")
                    .unwrap_or_else(|_| POPULATION_KEY.to_string()),
                user_agent: std::env::var("QUEST_USER_AGENT")
                    .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
                max_retries: std::env::var("QUEST_MAX_RETRIES")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_MAX_RETRIES),
                request_timeout_secs: std::env::var("QUEST_REQUEST_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            },
            analytics: AnalyticsConfig {
                bls_key: std::env::var("BLS_KEY").unwrap_or_else(|_| BLS_CURRENT_KEY.to_string()),
                population_key: std::env::var("POP_KEY")
                    .unwrap_or_else(|_| POPULATION_KEY.to_string()),
            },
            queue: QueueSettings {
                visibility_timeout_secs: std::env::var("QUEST_VISIBILITY_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_VISIBILITY_TIMEOUT_SECS),
                max_receive_count: std::env::var("QUEST_MAX_RECEIVE_COUNT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_MAX_RECEIVE_COUNT),
            },
            schedule_period_secs: std::env::var("QUEST_SCHEDULE_PERIOD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_SCHEDULE_PERIOD_SECS),
            task_timeout_secs: std::env::var("QUEST_TASK_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_TASK_TIMEOUT_SECS),
            batch_size: std::env::var("QUEST_BATCH_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_BATCH_SIZE),
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    ///
    /// The one hard ordering invariant of the design lives here: the queue
    /// visibility timeout must exceed the task timeout, otherwise a message
    /// can be redelivered while its consumer is still running.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bucket.is_empty() {
            anyhow::bail!("Bucket name cannot be empty");
        }

        if self.queue.visibility_timeout_secs <= self.task_timeout_secs {
            anyhow::bail!(
                "Queue visibility timeout ({}s) must exceed the task timeout ({}s)",
                self.queue.visibility_timeout_secs,
                self.task_timeout_secs
            );
        }

        if self.queue.max_receive_count == 0 {
            anyhow::bail!("max_receive_count must be greater than 0");
        }

        if self.batch_size == 0 {
            anyhow::bail!("Consumer batch size must be greater than 0");
        }

        if self.ingest.max_retries == 0 {
            anyhow::bail!("Ingest max_retries must be greater than 0");
        }

        if self.schedule_period_secs == 0 {
            anyhow::bail!("Schedule period must be greater than 0");
        }

        if !self.ingest.population_key.starts_with(POPULATION_PREFIX) {
            tracing::warn!(
                key = %self.ingest.population_key,
                "Population key is outside the notification prefix - writes will not trigger analytics"
            );
        }

        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            bucket: "rearc-quest-data".to_string(),
            ingest: IngestConfig::default(),
            analytics: AnalyticsConfig::default(),
            queue: QueueSettings::default(),
            schedule_period_secs: DEFAULT_SCHEDULE_PERIOD_SECS,
            task_timeout_secs: DEFAULT_TASK_TIMEOUT_SECS,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            bls_base: DEFAULT_BLS_BASE.to_string(),
            bls_index: DEFAULT_BLS_BASE.to_string(),
            population_url: DEFAULT_POPULATION_URL.to_string(),
            population_key: POPULATION_KEY.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            bls_key: BLS_CURRENT_KEY.to_string(),
            population_key: POPULATION_KEY.to_string(),
        }
    }
}

impl Default for QueueSettings {
    fn default() -> Self {
        Self {
            visibility_timeout_secs: DEFAULT_VISIBILITY_TIMEOUT_SECS,
            max_receive_count: DEFAULT_MAX_RECEIVE_COUNT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.queue.visibility_timeout_secs, 910);
        assert_eq!(config.task_timeout_secs, 900);
        assert_eq!(config.batch_size, 1);
    }

    #[test]
    fn test_visibility_timeout_must_exceed_task_timeout() {
        let mut config = PipelineConfig::default();
        config.queue.visibility_timeout_secs = 900;

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("visibility timeout"));

        // Equality is also invalid; strictly greater is required
        config.queue.visibility_timeout_secs = 901;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_bucket_rejected() {
        let mut config = PipelineConfig::default();
        config.bucket = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let mut config = PipelineConfig::default();
        config.batch_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_max_receive_count_rejected() {
        let mut config = PipelineConfig::default();
        config.queue.max_receive_count = 0;
        assert!(config.validate().is_err());
    }
}
