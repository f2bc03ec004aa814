use crate::loader::csv_sink::{COMPANY_COLUMN, PERIOD_COLUMN};
use crate::models::{CellValue, ColumnNames, ExtractedTable, PeriodRecord};
use crate::utils::error::ScrapeError;
use tracing::debug;

/// Transpose a statement table: one record per period, one field per category.
///
/// Every row keeps its own field. A label seen twice, or one that clashes with
/// `Year`/`Company`, gets a `.N` suffix.
pub fn reshape(table: ExtractedTable, company_id: &str) -> Result<Vec<PeriodRecord>, ScrapeError> {
    let expected = table.periods.len();
    if let Some(bad) = table.rows.iter().find(|r| r.values.len() != expected) {
        return Err(ScrapeError::ShapeMismatch {
            category: bad.category.clone(),
            expected,
            actual: bad.values.len(),
        });
    }

    let mut records: Vec<PeriodRecord> = table
        .periods
        .into_iter()
        .map(|period| PeriodRecord {
            period,
            values: Vec::with_capacity(table.rows.len()),
            company: company_id.to_string(),
        })
        .collect();

    let mut names = ColumnNames::reserving(&[PERIOD_COLUMN, COMPANY_COLUMN]);
    for row in table.rows {
        let name = names.claim(&row.category);
        if name != row.category {
            debug!("{}: row `{}` stored as `{}`", company_id, row.category, name);
        }
        for (record, value) in records.iter_mut().zip(row.values) {
            record.values.push((name.clone(), CellValue::Text(value)));
        }
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawTableRow;
    use crate::scraper::cleaner::clean_record;

    fn table(periods: &[&str], rows: &[(&str, &[&str])]) -> ExtractedTable {
        ExtractedTable {
            periods: periods.iter().map(|s| s.to_string()).collect(),
            rows: rows
                .iter()
                .map(|(c, v)| RawTableRow::new(*c, v.iter().map(|s| s.to_string()).collect()))
                .collect(),
        }
    }

    #[test]
    fn test_reshape_single_row() {
        let mut records = reshape(table(&["2022", "2023"], &[("Sales", &["100", "150"])]), "X").unwrap();
        records.iter_mut().for_each(clean_record);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].period, "2022");
        assert_eq!(records[0].get("Sales"), Some(&CellValue::Numeric(100.0)));
        assert_eq!(records[0].company, "X");
        assert_eq!(records[1].period, "2023");
        assert_eq!(records[1].get("Sales"), Some(&CellValue::Numeric(150.0)));
        assert_eq!(records[1].company, "X");
    }

    #[test]
    fn test_reshape_counts() {
        let t = table(
            &["Mar 2021", "Mar 2022", "Mar 2023"],
            &[
                ("Sales", &["1", "2", "3"]),
                ("Expenses", &["4", "5", "6"]),
                ("OPM %", &["7%", "8%", "9%"]),
                ("Tax %", &["25%", "26%", "NM"]),
            ],
        );
        let records = reshape(t, "TCS").unwrap();
        assert_eq!(records.len(), 3);
        for r in &records {
            assert_eq!(r.values.len(), 4);
            let names: Vec<&str> = r.values.iter().map(|(n, _)| n.as_str()).collect();
            assert_eq!(names, vec!["Sales", "Expenses", "OPM %", "Tax %"]);
        }
        assert_eq!(records[2].get("Tax %"), Some(&CellValue::Text("NM".into())));
    }

    #[test]
    fn test_reshape_shape_mismatch() {
        let t = table(&["2022", "2023"], &[("Sales", &["1", "2"]), ("Expenses", &["3"])]);
        match reshape(t, "X") {
            Err(ScrapeError::ShapeMismatch { category, expected, actual }) => {
                assert_eq!(category, "Expenses");
                assert_eq!(expected, 2);
                assert_eq!(actual, 1);
            }
            other => panic!("expected shape mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_reshape_keeps_repeated_labels() {
        let t = table(&["2022"], &[("Other", &["1"]), ("Other", &["2"]), ("Sales", &["3"])]);
        let records = reshape(t, "X").unwrap();
        let names: Vec<&str> = records[0].values.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Other", "Other.1", "Sales"]);
        assert_eq!(records[0].get("Other.1"), Some(&CellValue::Text("2".into())));
    }

    #[test]
    fn test_reshape_renames_fixed_column_labels() {
        let t = table(&["2022"], &[("Year", &["1"]), ("Company", &["2"])]);
        let records = reshape(t, "X").unwrap();
        let names: Vec<&str> = records[0].values.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Year.1", "Company.1"]);
        assert_eq!(records[0].period, "2022");
        assert_eq!(records[0].company, "X");
    }

    #[test]
    fn test_reshape_no_rows_still_yields_periods() {
        let records = reshape(table(&["2022"], &[]), "X").unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].values.is_empty());
    }
}
