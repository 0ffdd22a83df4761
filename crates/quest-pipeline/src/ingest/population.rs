//! DataUSA population fetch
//!
//! Pulls every available year of the national population series, normalizes
//! it to `[{"year": …, "population": …}, …]` sorted by year, and publishes the
//! JSON artifact atomically so a half-written file is never observable.

use anyhow::{bail, Context, Result};
use quest_common::types::{content_type, PopulationRow};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::IngestConfig;
use crate::store::{ObjectMeta, ObjectStore, PutOptions};

/// Fetches and publishes the population artifact
pub struct PopulationFetcher {
    client: Client,
    config: IngestConfig,
}

impl PopulationFetcher {
    pub fn new(client: Client, config: IngestConfig) -> Self {
        Self { client, config }
    }

    /// Fetch all available population rows, sorted by year.
    pub async fn fetch(&self) -> Result<Vec<PopulationRow>> {
        info!(url = %self.config.population_url, "Requesting population data");

        let response = self
            .client
            .get(&self.config.population_url)
            .send()
            .await
            .context("Population request failed")?;

        if !response.status().is_success() {
            bail!("Population request returned {}", response.status());
        }

        let payload: Value = response
            .json()
            .await
            .context("Population response was not valid JSON")?;

        let rows = parse_rows(&payload);
        info!(rows = rows.len(), "Fetched population rows");

        Ok(rows)
    }

    /// Publish rows as the population artifact under `key`.
    pub async fn publish(
        &self,
        store: &dyn ObjectStore,
        key: &str,
        rows: &[PopulationRow],
    ) -> Result<ObjectMeta> {
        let body = serde_json::to_vec(rows).context("Failed to serialize population rows")?;

        let meta = store
            .put_atomic(key, body, PutOptions::with_content_type(content_type::JSON))
            .await?;

        Ok(meta)
    }
}

/// Extract rows from the DataUSA payload, skipping malformed records.
///
/// The payload is `{"data": [{"Year": "2018", "Population": 327167439, …}]}`;
/// both fields occasionally arrive as strings, so parse either encoding.
pub fn parse_rows(payload: &Value) -> Vec<PopulationRow> {
    let records = match payload {
        Value::Object(map) => map.get("data").and_then(Value::as_array),
        Value::Array(_) => payload.as_array(),
        _ => None,
    };

    let mut rows: Vec<PopulationRow> = records
        .map(|records| {
            records
                .iter()
                .filter_map(|record| {
                    let year = as_i64(record.get("Year")?)?;
                    let population = as_i64(record.get("Population")?)?;
                    Some(PopulationRow {
                        year: year as i32,
                        population,
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    if rows.is_empty() {
        debug!("Population payload contained no usable rows");
    }

    rows.sort_by_key(|row| row.year);
    rows
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_parse_rows_sorted_and_tolerant() {
        let payload = json!({
            "data": [
                {"Year": "2019", "Population": 328239523, "Nation": "United States"},
                {"Year": "2018", "Population": "327167439"},
                {"Year": "bad-year", "Population": 1},
                {"Year": "2020"},
            ]
        });

        let rows = parse_rows(&payload);
        assert_eq!(
            rows,
            vec![
                PopulationRow { year: 2018, population: 327_167_439 },
                PopulationRow { year: 2019, population: 328_239_523 },
            ]
        );
    }

    #[test]
    fn test_parse_rows_empty_payload() {
        assert!(parse_rows(&json!({"data": []})).is_empty());
        assert!(parse_rows(&json!("not an object")).is_empty());
    }

    #[tokio::test]
    async fn test_fetch_and_publish() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"Year": "2018", "Population": 327167439}]
            })))
            .mount(&server)
            .await;

        let config = IngestConfig {
            population_url: server.uri(),
            ..IngestConfig::default()
        };
        let fetcher = PopulationFetcher::new(Client::new(), config);

        let rows = fetcher.fetch().await.unwrap();
        assert_eq!(rows.len(), 1);

        let store = MemoryStore::new();
        fetcher
            .publish(&store, "population/us.json", &rows)
            .await
            .unwrap();

        let stored = store.get("population/us.json").await.unwrap();
        let parsed: Vec<PopulationRow> = serde_json::from_slice(&stored).unwrap();
        assert_eq!(parsed, rows);

        // Staged publish leaves no intermediate keys behind
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_surfaces_http_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let config = IngestConfig {
            population_url: server.uri(),
            ..IngestConfig::default()
        };
        let fetcher = PopulationFetcher::new(Client::new(), config);

        let err = fetcher.fetch().await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }
}
