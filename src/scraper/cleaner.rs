use crate::models::{CellValue, PeriodRecord};
use serde::{Deserialize, Serialize};

// ── Cell cleaning ─────────────────────────────────────────────────────────────

/// Normalise one cell.
/// "1,234%" → 1234.0 | "+5.5" → 5.5 | "NM" → "NM" | "" → Missing
///
/// Only unsigned numbers with at most one decimal point become numeric;
/// anything else ("-12", "1.2.3") stays as cleaned text.
pub fn clean(value: CellValue) -> CellValue {
    match value {
        CellValue::Text(s) => clean_str(&s),
        other => other,
    }
}

pub fn clean_str(s: &str) -> CellValue {
    let stripped: String = s.chars().filter(|c| !matches!(c, ',' | '+' | '%')).collect();
    let stripped = stripped.trim();

    if stripped.is_empty() {
        return CellValue::Missing;
    }
    if is_plain_number(stripped) {
        if let Ok(n) = stripped.parse::<f64>() {
            return CellValue::Numeric(n);
        }
    }
    CellValue::Text(stripped.to_string())
}

/// ASCII digits with at most one '.', and at least one digit.
fn is_plain_number(s: &str) -> bool {
    let mut dots = 0;
    let mut digits = 0;
    for c in s.chars() {
        match c {
            '.' => dots += 1,
            c if c.is_ascii_digit() => digits += 1,
            _ => return false,
        }
    }
    dots <= 1 && digits > 0
}

/// Clean every category value of a record in place.
pub fn clean_record(record: &mut PeriodRecord) {
    for (_, value) in record.values.iter_mut() {
        *value = clean(std::mem::replace(value, CellValue::Missing));
    }
}

// ── Missing values ────────────────────────────────────────────────────────────

/// What a missing cell becomes before it is written to the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingPolicy {
    /// Zero: `0.0` in numeric columns, `"0"` in text columns.
    #[default]
    Zero,
    /// Leave as NULL.
    Null,
}

impl MissingPolicy {
    pub fn fill(self, value: CellValue, numeric_column: bool) -> CellValue {
        match (self, value) {
            (MissingPolicy::Zero, CellValue::Missing) if numeric_column => CellValue::Numeric(0.0),
            (MissingPolicy::Zero, CellValue::Missing) => CellValue::Text("0".to_string()),
            (_, v) => v,
        }
    }

    /// Fill the missing cells of a record; `is_numeric` says how each
    /// category column is stored.
    pub fn fill_record(self, record: &mut PeriodRecord, is_numeric: impl Fn(&str) -> bool) {
        for (name, value) in record.values.iter_mut() {
            if value.is_missing() {
                *value = self.fill(CellValue::Missing, is_numeric(name));
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
