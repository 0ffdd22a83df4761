//! Common types used across the Quest pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default key prefix for BLS time-series artifacts.
pub const BLS_PREFIX: &str = "rearc-data-quest/bls/";

/// Default key prefix for population artifacts (the notification filter prefix).
pub const POPULATION_PREFIX: &str = "rearc-data-quest/population/";

/// Default key of the population artifact.
pub const POPULATION_KEY: &str = "rearc-data-quest/population/us_population_all_years.json";

/// Default key of the BLS current-series artifact.
pub const BLS_CURRENT_KEY: &str = "rearc-data-quest/bls/pr.data.0.Current";

/// Content type constants for pipeline artifacts
pub mod content_type {
    pub const CSV: &str = "text/csv";
    pub const JSON: &str = "application/json";
    pub const OCTET_STREAM: &str = "application/octet-stream";
}

/// One row of the normalized population artifact.
///
/// Serialized as `{"year": 2018, "population": 327167439}`; the artifact is a
/// JSON array of these rows sorted by year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationRow {
    pub year: i32,
    pub population: i64,
}

/// One parsed row of the BLS `pr.data.0.Current` time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlsRow {
    pub series_id: String,
    pub year: i32,
    /// Reporting period, e.g. "Q01".."Q05" or "M01".."M13"
    pub period: String,
    pub value: f64,
}

impl BlsRow {
    /// Whether this row covers a quarterly period
    pub fn is_quarterly(&self) -> bool {
        self.period.starts_with('Q')
    }
}

/// Describes a single object-store write that matched the notification filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    /// Key of the object that was written
    pub key: String,
    /// What happened to the object
    pub event_type: EventType,
    /// When the write completed
    pub occurred_at: DateTime<Utc>,
}

impl NotificationEvent {
    pub fn created(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            event_type: EventType::Created,
            occurred_at: Utc::now(),
        }
    }
}

/// Object-store event kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Created,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventType::Created => write!(f, "created"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_population_row_serialization() {
        let row = PopulationRow {
            year: 2018,
            population: 327_167_439,
        };
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"year":2018,"population":327167439}"#);
    }

    #[test]
    fn test_bls_row_quarterly() {
        let mut row = BlsRow {
            series_id: "PRS30006032".to_string(),
            year: 2018,
            period: "Q01".to_string(),
            value: 1.9,
        };
        assert!(row.is_quarterly());
        row.period = "M05".to_string();
        assert!(!row.is_quarterly());
    }

    #[test]
    fn test_notification_event_roundtrip() {
        let event = NotificationEvent::created(POPULATION_KEY);
        let json = serde_json::to_string(&event).unwrap();
        let parsed: NotificationEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
        assert_eq!(parsed.event_type, EventType::Created);
    }
}
