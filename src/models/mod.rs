use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

// ── Company ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Company {
    pub id: String, // "RELIANCE", "TCS", ...
    pub url: String,
}

impl Company {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self { id: id.into(), url: url.into() }
    }
}

// ── Scraped table ─────────────────────────────────────────────────────────────

/// One `<tr>` of a statement table: the line-item label and its raw cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTableRow {
    pub category: String,
    pub values: Vec<String>,
}

impl RawTableRow {
    pub fn new(category: impl Into<String>, values: Vec<String>) -> Self {
        Self { category: category.into(), values }
    }
}

/// A statement table as found on the page, before any reshaping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedTable {
    /// Header labels with the leading "Parameters" cell already dropped.
    pub periods: Vec<String>,
    pub rows: Vec<RawTableRow>,
}

// ── Cell values ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Numeric(f64),
    Text(String),
    Missing,
}

impl CellValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }
}

/// CSV rendering: numbers use the shortest round-trip form, missing is empty.
impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Numeric(n) => write!(f, "{}", n),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Missing => Ok(()),
        }
    }
}

// ── Records ───────────────────────────────────────────────────────────────────

/// One (company, period) row of the final dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodRecord {
    pub period: String,
    /// Category → value, in table row order.
    pub values: Vec<(String, CellValue)>,
    pub company: String,
}

impl PeriodRecord {
    pub fn get(&self, category: &str) -> Option<&CellValue> {
        self.values
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, v)| v)
    }
}

/// Hands out column labels, suffixing repeats `.1`, `.2`, ... so that no two
/// columns of a row share a name.
#[derive(Debug, Default)]
pub struct ColumnNames {
    used: HashSet<String>,
}

impl ColumnNames {
    /// Start with `names` already taken.
    pub fn reserving(names: &[&str]) -> Self {
        Self { used: names.iter().map(|n| n.to_string()).collect() }
    }

    pub fn claim(&mut self, label: &str) -> String {
        if self.used.insert(label.to_string()) {
            return label.to_string();
        }
        let mut n = 1;
        loop {
            let candidate = format!("{}.{}", label, n);
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

/// All records of a run, in company order then period order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub records: Vec<PeriodRecord>,
}

impl Dataset {
    pub fn new(records: Vec<PeriodRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn extend(&mut self, records: Vec<PeriodRecord>) {
        self.records.extend(records);
    }

    /// Union of category names across all records, first-seen order.
    pub fn categories(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for record in &self.records {
            for (name, _) in &record.values {
                if !seen.iter().any(|s| s == name) {
                    seen.push(name.clone());
                }
            }
        }
        seen
    }

    /// Distinct period labels, first-seen order.
    pub fn periods(&self) -> Vec<String> {
        let mut seen: Vec<String> = Vec::new();
        for record in &self.records {
            if !seen.contains(&record.period) {
                seen.push(record.period.clone());
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(period: &str, company: &str, values: &[(&str, CellValue)]) -> PeriodRecord {
        PeriodRecord {
            period: period.to_string(),
            values: values.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
            company: company.to_string(),
        }
    }

    #[test]
    fn test_categories_first_seen_union() {
        let ds = Dataset::new(vec![
            record("2022", "A", &[("Sales", CellValue::Numeric(1.0)), ("Expenses", CellValue::Numeric(2.0))]),
            record("2022", "B", &[("Sales", CellValue::Numeric(3.0)), ("Interest", CellValue::Numeric(4.0))]),
        ]);
        assert_eq!(ds.categories(), vec!["Sales", "Expenses", "Interest"]);
    }

    #[test]
    fn test_periods_are_distinct() {
        let ds = Dataset::new(vec![
            record("2022", "A", &[]),
            record("2023", "A", &[]),
            record("2022", "B", &[]),
        ]);
        assert_eq!(ds.periods(), vec!["2022", "2023"]);
    }

    #[test]
    fn test_column_names_suffix_repeats() {
        let mut names = ColumnNames::reserving(&["Year", "Company"]);
        assert_eq!(names.claim("Other"), "Other");
        assert_eq!(names.claim("Other"), "Other.1");
        assert_eq!(names.claim("Other.1"), "Other.1.1");
        assert_eq!(names.claim("Other"), "Other.2");
        assert_eq!(names.claim("Company"), "Company.1");
    }

    #[test]
    fn test_cell_display() {
        assert_eq!(CellValue::Numeric(1234.0).to_string(), "1234");
        assert_eq!(CellValue::Numeric(5.5).to_string(), "5.5");
        assert_eq!(CellValue::Text("NM".into()).to_string(), "NM");
        assert_eq!(CellValue::Missing.to_string(), "");
    }
}
