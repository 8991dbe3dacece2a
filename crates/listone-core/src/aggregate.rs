// Aggregation: groups normalized rows by (name, role) and folds each group
// into a single player record.

use crate::document::PlayerDatabase;
use crate::normalize::NormalizedRow;
use crate::registry::season_year;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::debug;

/// Source whose annotations win over every other source's.
pub const DEFAULT_PREFERRED_COMMENT_SOURCE: &str = "sos_fanta";

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AggregateError {
    #[error("no rows to aggregate")]
    EmptyInput,
}

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Identity under which rows are merged. Neither component is normalized:
/// "A" and "a" are different roles.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlayerKey {
    pub name: String,
    pub role: String,
}

impl PlayerKey {
    fn of(row: &NormalizedRow) -> Self {
        Self {
            name: row.name.clone(),
            role: row.role.clone(),
        }
    }
}

/// Price spread across every source and season.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceStats {
    pub min: i64,
    pub max: i64,
    pub avg: f64,
}

/// One season's output for a player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SeasonPerformance {
    pub goals: i64,
    pub assists: i64,
    pub minutes: i64,
    pub rating: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Notes {
    pub comm: String,
}

/// The consolidated view of one player in one role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    #[serde(rename = "nome")]
    pub name: String,
    pub team: String,
    #[serde(rename = "prezzi")]
    pub prices: PriceStats,
    /// `"{source}_{year}"` → price.
    #[serde(rename = "allPrices")]
    pub all_prices: BTreeMap<String, i64>,
    /// Season label → performance.
    pub performance: BTreeMap<String, SeasonPerformance>,
    pub notes: Notes,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Round half away from zero to one decimal place.
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Min, max and mean of a non-empty price list.
pub fn price_stats(prices: &[f64]) -> Option<PriceStats> {
    if prices.is_empty() {
        return None;
    }
    let min = prices.iter().copied().fold(f64::INFINITY, f64::min);
    let max = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mean = prices.iter().sum::<f64>() / prices.len() as f64;
    Some(PriceStats {
        min: min.trunc() as i64,
        max: max.trunc() as i64,
        avg: round_one_decimal(mean),
    })
}

/// Pick the annotation for a group: the preferred source's last non-empty
/// comment if any row has one, else the first non-empty comment in row order.
fn resolve_comment(rows: &[NormalizedRow], preferred_source: &str) -> String {
    let mut preferred: Option<&str> = None;
    let mut fallback: Option<&str> = None;
    for row in rows {
        if row.comm.is_empty() {
            continue;
        }
        if row.source == preferred_source {
            preferred = Some(row.comm.as_str());
        } else if fallback.is_none() {
            fallback = Some(row.comm.as_str());
        }
    }
    preferred
        .or(fallback)
        .map(str::to_string)
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

/// Folds normalized rows into a [`PlayerDatabase`].
#[derive(Debug, Clone)]
pub struct Aggregator {
    seasons: Vec<String>,
    preferred_comment_source: String,
}

impl Aggregator {
    /// `seasons` are the registry's season labels; every record gets a
    /// performance entry for each of them.
    pub fn new(seasons: Vec<String>) -> Self {
        Self {
            seasons,
            preferred_comment_source: DEFAULT_PREFERRED_COMMENT_SOURCE.to_string(),
        }
    }

    pub fn with_preferred_comment_source(mut self, source: impl Into<String>) -> Self {
        self.preferred_comment_source = source.into();
        self
    }

    pub fn aggregate(&self, rows: Vec<NormalizedRow>) -> Result<PlayerDatabase, AggregateError> {
        if rows.is_empty() {
            return Err(AggregateError::EmptyInput);
        }

        let groups = group_rows(rows);
        debug!("aggregating {} player groups", groups.len());

        let mut db = PlayerDatabase::new();
        for (key, group) in groups {
            if let Some(record) = self.build_record(&key, &group) {
                db.push(key.role, record);
            }
        }
        Ok(db)
    }

    /// Build one record from a group. `None` for an empty group.
    fn build_record(&self, key: &PlayerKey, rows: &[NormalizedRow]) -> Option<PlayerRecord> {
        let prices: Vec<f64> = rows.iter().map(|r| r.price).collect();
        let prices = price_stats(&prices)?;

        let mut all_prices = BTreeMap::new();
        let mut performance = BTreeMap::new();
        for row in rows {
            let price_key = format!("{}_{}", row.source, season_year(&row.season));
            all_prices.insert(price_key, row.price.trunc() as i64);

            performance
                .entry(row.season.clone())
                .or_insert(SeasonPerformance {
                    goals: row.goals,
                    assists: row.assists,
                    minutes: row.minutes,
                    rating: row.rating,
                });
        }
        for season in &self.seasons {
            performance.entry(season.clone()).or_default();
        }

        Some(PlayerRecord {
            name: key.name.clone(),
            team: rows.first().map(|r| r.team.clone()).unwrap_or_default(),
            prices,
            all_prices,
            performance,
            notes: Notes {
                comm: resolve_comment(rows, &self.preferred_comment_source),
            },
        })
    }
}

/// Group rows by player key, keeping groups in first-seen order and rows in
/// input order within each group.
pub fn group_rows(rows: Vec<NormalizedRow>) -> Vec<(PlayerKey, Vec<NormalizedRow>)> {
    let mut index: HashMap<PlayerKey, usize> = HashMap::new();
    let mut groups: Vec<(PlayerKey, Vec<NormalizedRow>)> = Vec::new();
    for row in rows {
        let key = PlayerKey::of(&row);
        match index.get(&key) {
            Some(&i) => groups[i].1.push(row),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push((key, vec![row]));
            }
        }
    }
    groups
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
