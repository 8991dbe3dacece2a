// End-to-end run: registry → reader → normalizer → aggregator → document.

use crate::aggregate::{AggregateError, Aggregator};
use crate::config::Config;
use crate::document::{DocumentError, PlayerDatabase};
use crate::normalize::{normalize_row, NormalizedRow};
use crate::reader::{ReadError, TabularReader};
use crate::registry::SourceRegistry;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no source data found: none of the {declared} declared source files exist under {data_dir}")]
    NoSourceData { declared: usize, data_dir: PathBuf },

    #[error(transparent)]
    Read(#[from] ReadError),

    #[error("source files were found but yielded no usable rows")]
    NoRows(#[from] AggregateError),

    #[error(transparent)]
    Write(#[from] DocumentError),
}

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// What one source file contributed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedSource {
    pub season: String,
    pub source: String,
    pub path: PathBuf,
    /// Rows forwarded to the aggregator.
    pub rows: usize,
    /// Rows dropped for lacking a name, role or price.
    pub rejected: usize,
}

/// Rows gathered from every existing source file, in registry order.
#[derive(Debug, Clone)]
pub struct CollectedRows {
    pub rows: Vec<NormalizedRow>,
    pub sources: Vec<LoadedSource>,
}

/// Outcome of a full run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub sources: Vec<LoadedSource>,
    pub rows: usize,
    pub database: PlayerDatabase,
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// Read and normalize every declared source that exists under `data_dir`,
/// season by season and source by source.
///
/// Missing files are skipped. Fails with `NoSourceData` when not a single
/// declared file exists.
pub fn collect_rows<R: TabularReader>(
    registry: &SourceRegistry,
    data_dir: &Path,
    reader: &R,
) -> Result<CollectedRows, PipelineError> {
    let entries = registry.entries(data_dir);
    let declared = entries.len();

    let mut rows = Vec::new();
    let mut sources = Vec::new();
    for entry in entries {
        if !entry.path.exists() {
            debug!(
                "skipping {} {}: {} not found",
                entry.season,
                entry.source,
                entry.path.display()
            );
            continue;
        }

        let raw_rows = reader.read_rows(&entry.path)?;
        let mut accepted = 0;
        let mut rejected = 0;
        for (index, raw) in raw_rows.iter().enumerate() {
            match normalize_row(raw, entry.source, entry.season) {
                Ok(row) => {
                    rows.push(row);
                    accepted += 1;
                }
                Err(e) => {
                    warn!(
                        "skipping row {} of {}: {}",
                        index + 1,
                        entry.path.display(),
                        e
                    );
                    rejected += 1;
                }
            }
        }

        info!(
            "loaded {} rows from {} ({} {})",
            accepted,
            entry.path.display(),
            entry.source,
            entry.season
        );
        sources.push(LoadedSource {
            season: entry.season.to_string(),
            source: entry.source.to_string(),
            path: entry.path,
            rows: accepted,
            rejected,
        });
    }

    if sources.is_empty() {
        return Err(PipelineError::NoSourceData {
            declared,
            data_dir: data_dir.to_path_buf(),
        });
    }

    Ok(CollectedRows { rows, sources })
}

/// Collect rows for `config` and aggregate them into a database.
pub fn build_database<R: TabularReader>(
    config: &Config,
    reader: &R,
) -> Result<RunSummary, PipelineError> {
    let collected = collect_rows(&config.registry, &config.data_dir, reader)?;
    let rows = collected.rows.len();

    let aggregator = Aggregator::new(config.registry.season_labels())
        .with_preferred_comment_source(config.preferred_comment_source.clone());
    let database = aggregator.aggregate(collected.rows)?;

    info!(
        "aggregated {} rows into {} players across {} roles",
        rows,
        database.len(),
        database.buckets().len()
    );

    Ok(RunSummary {
        sources: collected.sources,
        rows,
        database,
    })
}

/// Build the database and write it to `config.output_path`. Nothing is
/// written if building fails.
pub fn run<R: TabularReader>(config: &Config, reader: &R) -> Result<RunSummary, PipelineError> {
    let summary = build_database(config, reader)?;
    summary.database.write_json(&config.output_path)?;
    info!("wrote {}", config.output_path.display());
    Ok(summary)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
