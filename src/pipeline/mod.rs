// Batch pipeline stages: extraction, transformation, loading.

pub mod extract;
pub mod load;
pub mod transform;

use crate::config::Config;
use crate::domain::MovieRating;
use crate::error::Result;
use std::path::Path;
use tracing::{info, instrument};

/// Outcome of one extract-transform-load run. `rows` is the in-memory
/// denormalized table handed on to the Reporter; `persisted_rows` and
/// `sample` come back out of the store for the post-load smoke check.
#[derive(Debug)]
pub struct PipelineSummary {
    pub rows: Vec<MovieRating>,
    pub persisted_rows: i64,
    pub sample: Vec<MovieRating>,
}

/// Runs extract, transform and load once, sequentially, with no retries.
/// Any stage error aborts the run; the store connection is scoped to the
/// load stage and released before this returns.
#[instrument(skip(config))]
pub fn run(config: &Config, data_dir: &Path) -> Result<PipelineSummary> {
    info!("starting extraction");
    let tables = extract::extract_all(data_dir)?;

    info!("starting transformation");
    let rows = transform::transform(&tables);

    info!(path = %config.database.path, table = %config.database.table, "starting load");
    let (persisted_rows, sample) = {
        let mut store = load::SqliteStore::open(&config.database.path)?;
        store.load_full_refresh(&config.database.table, &rows)?;
        let count = store.count_rows(&config.database.table)?;
        let sample = store.sample(&config.database.table, config.database.sample_rows)?;
        (count, sample)
    };

    Ok(PipelineSummary {
        rows,
        persisted_rows,
        sample,
    })
}
