//! Load phase: CSV artifact → destination table.

pub mod csv_sink;

use crate::config::StoreConfig;
use crate::models::Dataset;
use crate::storage::Repository;
use crate::utils::error::LoadError;
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

use self::csv_sink::{is_numeric_column, read_csv};

/// Read the artifact, fill missing cells, and replace the matching periods.
/// Returns the number of rows inserted.
pub fn load(path: &Path, store: &StoreConfig) -> Result<usize, LoadError> {
    let mut dataset = read_csv(path)?;
    info!("Read {} rows from {:?}", dataset.len(), path);

    if dataset.is_empty() {
        info!("Nothing to load");
        return Ok(0);
    }

    // Column types are decided before filling, so a zero never turns a
    // text column numeric or the other way round.
    let numeric: HashSet<String> = dataset
        .categories()
        .into_iter()
        .filter(|c| is_numeric_column(&dataset, c))
        .collect();
    for record in dataset.records.iter_mut() {
        store.missing_policy.fill_record(record, |c| numeric.contains(c));
    }

    let repo = Repository::open(store)?;
    load_into(&repo, &dataset, store.atomic_replace)
}

fn load_into(repo: &Repository, dataset: &Dataset, atomic: bool) -> Result<usize, LoadError> {
    repo.ensure_table(dataset)?;
    let inserted = repo.replace_periods(dataset, atomic)?;
    info!("Inserted {} rows for periods {:?}", inserted, dataset.periods());
    Ok(inserted)
}
