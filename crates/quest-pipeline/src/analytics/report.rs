//! Derived statistics
//!
//! The three reports computed per analytics run, recovered one-to-one from
//! the original notebook: population mean/stddev for 2013-2018, the best
//! (highest quarterly sum) year per series, and the PRS30006032 Q01 series
//! joined with population.

use quest_common::types::BlsRow;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// First year (inclusive) of the population statistics window.
pub const STATS_START_YEAR: i32 = 2013;

/// Last year (inclusive) of the population statistics window.
pub const STATS_END_YEAR: i32 = 2018;

/// Series the joined report is computed for.
pub const REPORT_SERIES_ID: &str = "PRS30006032";

/// Period the joined report is computed for.
pub const REPORT_PERIOD: &str = "Q01";

/// Mean and population standard deviation over the statistics window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PopulationStats {
    pub mean: f64,
    pub std_dev: f64,
}

/// The year with the largest sum of quarterly values for one series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestYear {
    pub series_id: String,
    pub year: i32,
    pub total: f64,
}

/// One row of the series/population join
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPopulationRow {
    pub series_id: String,
    pub year: i32,
    pub period: String,
    pub value: f64,
    /// Population for the row's year, when the population artifact covers it
    pub population: Option<i64>,
}

/// Mean and population standard deviation of the population for 2013-2018.
///
/// Returns `None` when fewer than two of those years are present, matching
/// the original behavior of logging a warning and producing no stats.
pub fn population_stats(by_year: &BTreeMap<i32, i64>) -> Option<PopulationStats> {
    let values: Vec<f64> = (STATS_START_YEAR..=STATS_END_YEAR)
        .filter_map(|year| by_year.get(&year).map(|&p| p as f64))
        .collect();

    if values.len() < 2 {
        return None;
    }

    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values
        .iter()
        .map(|v| (v - mean).powi(2))
        .sum::<f64>()
        / values.len() as f64;

    Some(PopulationStats {
        mean,
        std_dev: variance.sqrt(),
    })
}

/// For every series, the year with the largest sum of quarterly values.
///
/// Only `Q…` periods contribute. Output is sorted by series id; a tie on the
/// total resolves to the earlier year, keeping the result deterministic.
pub fn best_years(rows: &[BlsRow]) -> Vec<BestYear> {
    let mut sums: BTreeMap<(&str, i32), f64> = BTreeMap::new();
    for row in rows.iter().filter(|r| r.is_quarterly()) {
        *sums.entry((row.series_id.as_str(), row.year)).or_insert(0.0) += row.value;
    }

    let mut best: BTreeMap<&str, (i32, f64)> = BTreeMap::new();
    for ((series_id, year), total) in sums {
        match best.get(series_id) {
            Some(&(_, current)) if total <= current => {},
            _ => {
                best.insert(series_id, (year, total));
            },
        }
    }

    best.into_iter()
        .map(|(series_id, (year, total))| BestYear {
            series_id: series_id.to_string(),
            year,
            total,
        })
        .collect()
}

/// Rows for the report series/period joined with population by year.
pub fn series_population(
    rows: &[BlsRow],
    by_year: &BTreeMap<i32, i64>,
) -> Vec<SeriesPopulationRow> {
    rows.iter()
        .filter(|row| row.series_id == REPORT_SERIES_ID && row.period == REPORT_PERIOD)
        .map(|row| SeriesPopulationRow {
            series_id: row.series_id.clone(),
            year: row.year,
            period: row.period.clone(),
            value: row.value,
            population: by_year.get(&row.year).copied(),
        })
        .collect()
}
