//! The CSV artifact handed from the scrape phase to the load phase.
//!
//! Layout: `Year,<category_1>,...,<category_n>,Company`, one row per
//! (company, period). Numbers are written in shortest round-trip form and
//! missing cells as empty fields.

use crate::models::{CellValue, ColumnNames, Dataset, PeriodRecord};
use crate::scraper::cleaner::clean_str;
use crate::utils::error::LoadError;
use std::path::Path;
use tracing::{debug, info};

pub const PERIOD_COLUMN: &str = "Year";
pub const COMPANY_COLUMN: &str = "Company";

/// Overwrite `path` with the dataset.
pub fn write_csv(dataset: &Dataset, path: &Path) -> Result<(), LoadError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let categories = dataset.categories();
    let mut writer = csv::Writer::from_path(path)?;

    let mut header = Vec::with_capacity(categories.len() + 2);
    header.push(PERIOD_COLUMN);
    header.extend(categories.iter().map(String::as_str));
    header.push(COMPANY_COLUMN);
    writer.write_record(&header)?;

    for record in &dataset.records {
        let mut row = Vec::with_capacity(header.len());
        row.push(record.period.clone());
        for category in &categories {
            row.push(record.get(category).map(|v| v.to_string()).unwrap_or_default());
        }
        row.push(record.company.clone());
        writer.write_record(&row)?;
    }

    writer.flush()?;
    info!("Wrote {} rows x {} categories to {:?}", dataset.len(), categories.len(), path);
    Ok(())
}

/// Read the artifact back, cleaning every category cell.
///
/// The first column is the period label. A `Company` column, wherever it is,
/// is the company; everything else is a category.
pub fn read_csv(path: &Path) -> Result<Dataset, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(LoadError::EmptyHeader(path.display().to_string()));
    }
    let company_idx = headers.iter().position(|h| h == COMPANY_COLUMN);

    // A hand-edited artifact may repeat a header; keep each column apart.
    let mut names = ColumnNames::reserving(&[headers[0].as_str(), COMPANY_COLUMN]);
    let categories: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| if i == 0 || Some(i) == company_idx { h.clone() } else { names.claim(h) })
        .collect();

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result?;
        let mut record = PeriodRecord {
            period: row.get(0).unwrap_or_default().to_string(),
            values: Vec::with_capacity(headers.len().saturating_sub(2)),
            company: String::new(),
        };

        for (i, name) in categories.iter().enumerate().skip(1) {
            let cell = row.get(i).unwrap_or_default();
            if Some(i) == company_idx {
                record.company = cell.to_string();
            } else {
                record.values.push((name.clone(), clean_str(cell)));
            }
        }
        records.push(record);
    }

    debug!("Read {} rows from {:?}", records.len(), path);
    Ok(Dataset::new(records))
}

/// True when every non-missing value in the column is numeric.
pub fn is_numeric_column(dataset: &Dataset, category: &str) -> bool {
    dataset
        .records
        .iter()
        .filter_map(|r| r.get(category))
        .all(|v| matches!(v, CellValue::Numeric(_) | CellValue::Missing))
}
