// Source registry: which pricing sources exist for which season, and where
// their spreadsheet exports live.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Sources shipped with the tool, in the order their rows are consumed.
const BUILTIN_SOURCES: [&str; 4] = ["fantaboom", "fantaclassic", "profeta", "sos_fanta"];

/// Seasons shipped with the tool, most recent first.
const BUILTIN_SEASONS: [&str; 2] = ["2025_26", "2024_25"];

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("registry declares no seasons")]
    Empty,

    #[error("invalid season label '{0}': expected YYYY_YY")]
    InvalidSeasonLabel(String),

    #[error("season '{0}' is declared more than once")]
    DuplicateSeason(String),

    #[error("season '{0}' declares no sources")]
    NoSources(String),

    #[error("season '{season}' has a source with an empty name")]
    EmptySourceName { season: String },

    #[error("season '{season}' declares source '{source_name}' more than once")]
    DuplicateSource { season: String, source_name: String },
}

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// One named source and the file holding its export for a season.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceSpec {
    pub name: String,
    pub file: PathBuf,
}

/// All sources declared for a single season.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SeasonSources {
    pub label: String,
    pub sources: Vec<SourceSpec>,
}

/// A (season, source) pair resolved against a data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry<'a> {
    pub season: &'a str,
    pub source: &'a str,
    pub path: PathBuf,
}

/// Ordered declaration of seasons and their sources.
///
/// Declaration order matters: rows are read season by season, source by
/// source, and the aggregator's first-write-wins rules follow that order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRegistry {
    seasons: Vec<SeasonSources>,
}

impl SourceRegistry {
    pub fn new(seasons: Vec<SeasonSources>) -> Self {
        Self { seasons }
    }

    /// The registry shipped with the tool: every built-in source for every
    /// built-in season, stored as `<source>_<season>.csv`.
    pub fn builtin() -> Self {
        let seasons = BUILTIN_SEASONS
            .iter()
            .map(|season| SeasonSources {
                label: (*season).to_string(),
                sources: BUILTIN_SOURCES
                    .iter()
                    .map(|source| SourceSpec {
                        name: (*source).to_string(),
                        file: PathBuf::from(format!("{source}_{season}.csv")),
                    })
                    .collect(),
            })
            .collect();
        Self { seasons }
    }

    pub fn seasons(&self) -> &[SeasonSources] {
        &self.seasons
    }

    /// Season labels in declaration order.
    pub fn season_labels(&self) -> Vec<String> {
        self.seasons.iter().map(|s| s.label.clone()).collect()
    }

    /// Every declared (season, source) pair with its path joined onto
    /// `data_dir`. Absolute file paths are kept as they are.
    pub fn entries(&self, data_dir: &Path) -> Vec<SourceEntry<'_>> {
        self.seasons
            .iter()
            .flat_map(|season| {
                season.sources.iter().map(move |spec| SourceEntry {
                    season: season.label.as_str(),
                    source: spec.name.as_str(),
                    path: data_dir.join(&spec.file),
                })
            })
            .collect()
    }

    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.seasons.is_empty() {
            return Err(RegistryError::Empty);
        }

        let mut labels = HashSet::new();
        for season in &self.seasons {
            if !is_season_label(&season.label) {
                return Err(RegistryError::InvalidSeasonLabel(season.label.clone()));
            }
            if !labels.insert(season.label.as_str()) {
                return Err(RegistryError::DuplicateSeason(season.label.clone()));
            }
            if season.sources.is_empty() {
                return Err(RegistryError::NoSources(season.label.clone()));
            }

            let mut names = HashSet::new();
            for spec in &season.sources {
                if spec.name.trim().is_empty() {
                    return Err(RegistryError::EmptySourceName {
                        season: season.label.clone(),
                    });
                }
                if !names.insert(spec.name.as_str()) {
                    return Err(RegistryError::DuplicateSource {
                        season: season.label.clone(),
                        source_name: spec.name.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

// ---------------------------------------------------------------------------
// Season label helpers
// ---------------------------------------------------------------------------

/// Whether `label` has the `YYYY_YY` shape, e.g. `2025_26`.
pub fn is_season_label(label: &str) -> bool {
    let bytes = label.as_bytes();
    bytes.len() == 7
        && bytes[4] == b'_'
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[5..].iter().all(u8::is_ascii_digit)
}

/// The part of a season label before its first `_` (`"2025_26"` → `"2025"`).
/// Labels without a separator are returned whole.
pub fn season_year(label: &str) -> &str {
    label.split('_').next().unwrap_or(label)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
