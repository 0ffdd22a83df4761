//! Artifact loaders
//!
//! Both loaders are tolerant of individual bad rows (the upstream files are
//! hand-curated government data); only a structurally unreadable artifact is
//! an error.

use anyhow::{Context, Result};
use quest_common::types::BlsRow;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Parse the population JSON artifact into a year -> population map.
pub fn parse_population(data: &[u8]) -> Result<BTreeMap<i32, i64>> {
    let records: Vec<Value> =
        serde_json::from_slice(data).context("Population artifact is not a JSON array")?;

    let mut by_year = BTreeMap::new();
    for record in &records {
        let Some(year) = record.get("year").and_then(Value::as_i64) else {
            debug!("Skipping population record without a usable year");
            continue;
        };
        let Some(population) = record.get("population").and_then(Value::as_i64) else {
            debug!(year, "Skipping population record without a usable population");
            continue;
        };
        by_year.insert(year as i32, population);
    }

    Ok(by_year)
}

/// Parse the tab-delimited BLS current file into typed rows.
///
/// Fields arrive padded with whitespace; rows that fail to parse are skipped.
pub fn parse_bls(data: &[u8]) -> Result<Vec<BlsRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(data);

    let headers = reader
        .headers()
        .context("BLS artifact has no header row")?
        .clone();

    let column = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h == name)
            .with_context(|| format!("BLS artifact is missing the '{name}' column"))
    };

    let series_id_col = column("series_id")?;
    let year_col = column("year")?;
    let period_col = column("period")?;
    let value_col = column("value")?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("Failed to read BLS record")?;

        let parsed = (|| -> Option<BlsRow> {
            Some(BlsRow {
                series_id: record.get(series_id_col)?.to_string(),
                year: record.get(year_col)?.parse().ok()?,
                period: record.get(period_col)?.to_string(),
                value: record.get(value_col)?.parse().ok()?,
            })
        })();

        match parsed {
            Some(row) => rows.push(row),
            None => debug!("Skipping unparsable BLS record"),
        }
    }

    Ok(rows)
}
